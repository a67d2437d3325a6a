//! Key categories and the flat `"category-id"` namespace.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Separator between category and id in a composite key.
pub const SEPARATOR: char = '-';

/// Kind of key material an entry holds.
///
/// The set is open: tags this crate does not know are carried as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    PreKey,
    Session,
    SenderKey,
    SenderKeyMemory,
    AppStateSyncKey,
    AppStateSyncVersion,
    LidMapping,
    DeviceList,
    TcToken,
    IdentityKey,
    Other(String),
}

impl Category {
    pub const KNOWN: [Category; 10] = [
        Category::PreKey,
        Category::Session,
        Category::SenderKey,
        Category::SenderKeyMemory,
        Category::AppStateSyncKey,
        Category::AppStateSyncVersion,
        Category::LidMapping,
        Category::DeviceList,
        Category::TcToken,
        Category::IdentityKey,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::PreKey => "pre-key",
            Category::Session => "session",
            Category::SenderKey => "sender-key",
            Category::SenderKeyMemory => "sender-key-memory",
            Category::AppStateSyncKey => "app-state-sync-key",
            Category::AppStateSyncVersion => "app-state-sync-version",
            Category::LidMapping => "lid-mapping",
            Category::DeviceList => "device-list",
            Category::TcToken => "tctoken",
            Category::IdentityKey => "identity-key",
            Category::Other(tag) => tag,
        }
    }

    /// Split a composite key back into category and id.
    ///
    /// Only known categories can be recovered reliably since both parts may
    /// contain the separator; the longest matching known tag wins. Returns
    /// `None` when no known tag prefixes the key.
    pub fn split_composite(composite: &str) -> Option<(Category, &str)> {
        Self::KNOWN
            .iter()
            .filter_map(|category| {
                composite
                    .strip_prefix(category.as_str())
                    .and_then(|rest| rest.strip_prefix(SEPARATOR))
                    .map(|id| (category.clone(), id))
            })
            .max_by_key(|(category, _)| category.as_str().len())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::KNOWN
            .iter()
            .find(|c| c.as_str() == s)
            .cloned()
            .unwrap_or_else(|| Category::Other(s.to_owned())))
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(category) => category,
            Err(never) => match never {},
        }
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Category::from(tag.as_str()))
    }
}

/// Address of one entry: a category plus an item id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyRef<'a> {
    pub category: &'a Category,
    pub id: &'a str,
}

impl<'a> KeyRef<'a> {
    pub fn new(category: &'a Category, id: &'a str) -> Self {
        Self { category, id }
    }

    /// The flat key used in the backing file.
    pub fn composite(&self) -> String {
        format!("{}{}{}", self.category, SEPARATOR, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_parse_and_display() {
        for category in Category::KNOWN {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
            assert_eq!(parsed.to_string(), category.as_str());
        }
    }

    #[test]
    fn unknown_tag_is_other() {
        let category = Category::from("my-custom-kind");
        assert_eq!(category, Category::Other("my-custom-kind".into()));
        assert_eq!(category.to_string(), "my-custom-kind");
    }

    #[test]
    fn composite_joins_with_separator() {
        let category = Category::AppStateSyncKey;
        assert_eq!(KeyRef::new(&category, "AAAAAPlt").composite(), "app-state-sync-key-AAAAAPlt");
    }

    #[test]
    fn split_prefers_longest_tag() {
        let (category, id) = Category::split_composite("sender-key-memory-group@g.us").unwrap();
        assert_eq!(category, Category::SenderKeyMemory);
        assert_eq!(id, "group@g.us");

        let (category, id) = Category::split_composite("sender-key-g@g.us--u--0").unwrap();
        assert_eq!(category, Category::SenderKey);
        assert_eq!(id, "g@g.us--u--0");
    }

    #[test]
    fn split_unknown_is_none() {
        assert!(Category::split_composite("custom-1").is_none());
        assert!(Category::split_composite("session").is_none());
    }
}
