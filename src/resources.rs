/// Toolbar icon, referenced by resource name. The actual pixmap lives in
/// whatever icon theme the embedding viewer ships; tools only carry the
/// handle around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    name: String,
}

impl Icon {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Pointer cursor shown while a tool is active.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Arrow,
    Crosshair,
    Hidden,
    FromIcon(Icon),
}

impl Cursor {
    /// The default cursor for a tool is its toolbar icon rendered at the
    /// pointer hotspot.
    pub fn from_icon(icon: &Icon) -> Self {
        Cursor::FromIcon(icon.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_derived_from_icon_keeps_the_icon() {
        let icon = Icon::named("measure");
        assert_eq!(Cursor::from_icon(&icon), Cursor::FromIcon(icon));
    }
}
