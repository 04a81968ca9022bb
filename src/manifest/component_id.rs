use crate::config::LibraryPattern;
use std::fmt;

/// Character class of a component's local name, as used in tag and key patterns
pub const NAME_CLASS: &str = "[a-z0-9_-]";

/// A library component, identified by its owning prefix and local name
///
/// Manifest keys and markup tags carry the flattened `prefix-name` form; it is
/// split once, with the configured prefixes, when read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    pub prefix: String,
    pub name: String,
}

impl ComponentId {
    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            name: name.into(),
        }
    }

    /// Manifest key / tag name: `prefix-name`
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Split a `prefix-name` key using the configured prefixes
    ///
    /// The longest matching prefix wins, so `my-ui-button` resolves to
    /// `(my-ui, button)` when both `my` and `my-ui` are configured.
    pub fn parse(key: &str, patterns: &[LibraryPattern]) -> Option<Self> {
        patterns
            .iter()
            .filter_map(|pattern| {
                let rest = key.strip_prefix(pattern.prefix.as_str())?.strip_prefix('-')?;
                is_component_name(rest).then(|| (pattern.prefix.len(), Self::new(&pattern.prefix, rest)))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, id)| id)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.name)
    }
}

/// Whether `name` is usable as a component's local name (`[a-z0-9_-]+`)
pub fn is_component_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<LibraryPattern> {
        vec![
            LibraryPattern::new("@vant/weapp", "van"),
            LibraryPattern::new("my", "my"),
            LibraryPattern::new("my-ui", "my-ui"),
        ]
    }

    #[test]
    fn test_parse_simple_key() {
        let id = ComponentId::parse("van-button", &patterns()).unwrap();
        assert_eq!(id, ComponentId::new("van", "button"));
        assert_eq!(id.key(), "van-button");
    }

    #[test]
    fn test_parse_hyphenated_name() {
        let id = ComponentId::parse("van-goods-action-icon", &patterns()).unwrap();
        assert_eq!(id.name, "goods-action-icon");
    }

    #[test]
    fn test_parse_longest_prefix_wins() {
        let id = ComponentId::parse("my-ui-button", &patterns()).unwrap();
        assert_eq!(id, ComponentId::new("my-ui", "button"));
    }

    #[test]
    fn test_parse_rejects_foreign_keys() {
        assert!(ComponentId::parse("vant-button", &patterns()).is_none());
        assert!(ComponentId::parse("van-", &patterns()).is_none());
        assert!(ComponentId::parse("van-Button", &patterns()).is_none());
        assert!(ComponentId::parse("card", &patterns()).is_none());
    }

    #[test]
    fn test_is_component_name() {
        assert!(is_component_name("tab-bar2"));
        assert!(!is_component_name(""));
        assert!(!is_component_name("../x"));
    }
}
