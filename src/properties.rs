use hex_color::HexColor;
use log::{debug, warn};
use thiserror::Error;
use toml::Value;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("expected a {expected} value, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid color string: {0}")]
    InvalidColor(#[from] hex_color::ParseHexColorError),
}

/// The typed payload of a single property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Color(HexColor),
}

impl PropertyValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Text(_) => "text",
            PropertyValue::Color(_) => "color",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<HexColor> {
        match self {
            PropertyValue::Color(v) => Some(*v),
            _ => None,
        }
    }

    fn to_config_value(&self) -> Value {
        match self {
            PropertyValue::Bool(v) => Value::Boolean(*v),
            PropertyValue::Int(v) => Value::Integer(*v),
            PropertyValue::Float(v) => Value::Float(*v),
            PropertyValue::Text(v) => Value::String(v.clone()),
            PropertyValue::Color(v) => Value::String(v.display_rgba().to_string()),
        }
    }

    /// Replace the payload from a config entry of a compatible type.
    ///
    /// The declared kind stays fixed; integers widen into float properties,
    /// everything else must match exactly. Colors are stored as hex strings.
    fn apply(&mut self, value: &Value) -> Result<(), PropertyError> {
        let expected = self.kind();
        let found = value.type_str();

        *self = match (&*self, value) {
            (PropertyValue::Bool(_), Value::Boolean(v)) => PropertyValue::Bool(*v),
            (PropertyValue::Int(_), Value::Integer(v)) => PropertyValue::Int(*v),
            (PropertyValue::Float(_), Value::Float(v)) => PropertyValue::Float(*v),
            (PropertyValue::Float(_), Value::Integer(v)) => PropertyValue::Float(*v as f64),
            (PropertyValue::Text(_), Value::String(v)) => PropertyValue::Text(v.clone()),
            (PropertyValue::Color(_), Value::String(v)) => {
                PropertyValue::Color(v.parse::<HexColor>()?)
            }
            _ => return Err(PropertyError::TypeMismatch { expected, found }),
        };
        Ok(())
    }
}

/// A single named, typed configuration entry of a tool.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    description: String,
    value: PropertyValue,
}

impl Property {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        value: PropertyValue,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub fn set_value(&mut self, value: PropertyValue) {
        self.value = value;
    }
}

/// The property subtree owned by one tool.
///
/// Variants attach their configurable state here during construction or
/// `on_initialize`; the properties panel displays it and the persistence
/// layer walks it.
#[derive(Default, Debug)]
pub struct PropertyContainer {
    name: String,
    children: Vec<Property>,
}

impl PropertyContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Attach a child property. A child with the same name is replaced.
    pub fn add(&mut self, property: Property) {
        match self.children.iter_mut().find(|c| c.name == property.name) {
            Some(existing) => *existing = property,
            None => self.children.push(property),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    pub fn children(&self) -> &[Property] {
        &self.children
    }

    pub fn bool_value(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|p| p.value.as_bool())
    }

    pub fn float_value(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|p| p.value.as_float())
    }

    pub fn color_value(&self, name: &str) -> Option<HexColor> {
        self.get(name).and_then(|p| p.value.as_color())
    }

    pub fn set_value(&mut self, name: &str, value: PropertyValue) -> bool {
        match self.get_mut(name) {
            Some(property) => {
                property.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Write one config entry per child, named and typed as declared.
    pub fn save_children(&self, config: &mut Config) {
        for child in &self.children {
            config.insert(&child.name, child.value.to_config_value());
        }
    }

    /// Apply matching config entries to the children.
    ///
    /// Keys without a matching child are ignored, and a child without a key
    /// keeps its current value. A type-incompatible entry is skipped with a
    /// warning; it never aborts the rest of the load.
    pub fn load_children(&mut self, config: &Config) {
        for (key, value) in config.entries() {
            let Some(child) = self.get_mut(key) else {
                debug!("property container '{}': no property named '{key}'", self.name);
                continue;
            };
            if let Err(e) = child.value.apply(value) {
                warn!(
                    "property container '{}': skipping entry '{key}': {e}",
                    self.name
                );
            }
        }
    }
}
