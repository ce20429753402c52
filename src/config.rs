use toml::value::{Table, Value};

/// A tree of named, typed values: the unit of persistence handed to
/// [`Tool::load`]/[`Tool::save`](crate::tools::Tool::save) and written to
/// disk by the session layer.
///
/// Backed by a toml table, so nesting, typing and the on-disk format all
/// come from the `toml` crate rather than a bespoke serializer.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Config {
    root: Table,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(root: Table) -> Self {
        Self { root }
    }

    pub fn into_table(self) -> Table {
        self.root
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.root.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.root.get(key).and_then(Value::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.root.get(key).and_then(Value::as_integer)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.root.get(key).and_then(Value::as_bool)
    }

    /// Nested child table, if present.
    pub fn child(&self, key: &str) -> Option<Config> {
        self.root
            .get(key)
            .and_then(Value::as_table)
            .map(|t| Config::from_table(t.clone()))
    }

    /// Nested child table, created empty when missing. An existing entry of
    /// a different type is replaced.
    pub fn child_mut(&mut self, key: &str) -> &mut Table {
        let entry = self
            .root
            .entry(key.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }
        match entry {
            Value::Table(table) => table,
            _ => unreachable!(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.root.iter()
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(&self.root)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        Ok(Self::from_table(toml::from_str::<Table>(content)?))
    }
}
