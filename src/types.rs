//! Level records produced by the crawl.

use serde::{Deserialize, Serialize};

/// One card of the ranked list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub rank: u64,
    pub name: String,
    /// Absolute URL of the level page.
    pub link: String,
}

/// Fields read from a level page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDetails {
    pub length: Option<String>,
    pub objects: Option<u64>,
    pub version: Option<String>,
}

/// Persisted unit: summary plus detail fields, in this field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub rank: u64,
    pub name: String,
    pub link: String,
    pub length: Option<String>,
    pub objects: Option<u64>,
    pub version: Option<String>,
}

impl From<LevelSummary> for Level {
    fn from(summary: LevelSummary) -> Self {
        Self {
            rank: summary.rank,
            name: summary.name,
            link: summary.link,
            length: None,
            objects: None,
            version: None,
        }
    }
}

impl Level {
    /// Replaces all three detail fields, absent ones included.
    pub fn with_details(mut self, details: LevelDetails) -> Self {
        self.length = details.length;
        self.objects = details.objects;
        self.version = details.version;
        self
    }

    pub fn has_details(&self) -> bool {
        self.length.is_some() || self.objects.is_some() || self.version.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> LevelSummary {
        LevelSummary {
            rank: 1,
            name: "Thinking Space II".into(),
            link: "https://demonlist.org/classic/1".into(),
        }
    }

    #[test]
    fn test_merge_overwrites_all_fields() {
        let level = Level::from(summary()).with_details(LevelDetails {
            length: Some("2:10".into()),
            objects: Some(1234),
            version: None,
        });
        assert_eq!(level.length.as_deref(), Some("2:10"));
        assert_eq!(level.objects, Some(1234));
        assert!(level.version.is_none());
        assert!(level.has_details());
        assert!(!Level::from(summary()).has_details());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_string(&Level::from(summary())).unwrap();
        assert_eq!(
            json,
            r#"{"rank":1,"name":"Thinking Space II","link":"https://demonlist.org/classic/1","length":null,"objects":null,"version":null}"#
        );
    }
}
