//! Topics surfaced by trend discovery.

use serde::{Deserialize, Deserializer, Serialize};

/// A candidate subject with attribution and rationale.
///
/// Only `topic` is required; the generator frequently omits the rest or
/// sends them as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Short name of the topic
    #[serde(rename = "topic")]
    pub name: String,

    /// Person or organisation behind it, "N/A" when there is none
    #[serde(
        rename = "who",
        default = "not_applicable",
        deserialize_with = "or_not_applicable"
    )]
    pub originator: String,

    /// What the originator said
    #[serde(default, deserialize_with = "or_empty")]
    pub statement: String,

    /// Why it matters
    #[serde(rename = "impact", default, deserialize_with = "or_empty")]
    pub rationale: String,
}

fn not_applicable() -> String {
    "N/A".to_string()
}

fn or_not_applicable<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(not_applicable))
}

fn or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            originator: not_applicable(),
            statement: String::new(),
            rationale: String::new(),
        }
    }
}

/// Bounded memory of the most recent topic names.
///
/// Volatile: rebuilt empty on every process start.
#[derive(Debug, Clone)]
pub struct RecentThemes {
    names: Vec<String>,
    capacity: usize,
}

impl RecentThemes {
    pub fn new(capacity: usize) -> Self {
        Self {
            names: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Replace the remembered themes with the first `capacity` topic names.
    pub fn remember(&mut self, topics: &[Topic]) {
        self.names = topics
            .iter()
            .take(self.capacity)
            .map(|t| t.name.clone())
            .collect();
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_defaults_missing_fields() {
        let topic: Topic = serde_json::from_str(r#"{"topic":"ETF flows"}"#).unwrap();
        assert_eq!(topic.name, "ETF flows");
        assert_eq!(topic.originator, "N/A");
        assert!(topic.statement.is_empty());
    }

    #[test]
    fn test_topic_null_fields() {
        let topic: Topic = serde_json::from_str(
            r#"{"topic":"ETF inflows","who":null,"statement":null,"impact":"flows"}"#,
        )
        .unwrap();
        assert_eq!(topic.originator, "N/A");
        assert_eq!(topic.statement, "");
        assert_eq!(topic.rationale, "flows");

        assert!(serde_json::from_str::<Topic>(r#"{"who":"RBI"}"#).is_err());
    }

    #[test]
    fn test_recent_themes_bounded() {
        let topics: Vec<Topic> = (0..8).map(|i| Topic::new(format!("t{}", i))).collect();
        let mut recent = RecentThemes::new(5);
        recent.remember(&topics);

        assert_eq!(recent.names(), &["t0", "t1", "t2", "t3", "t4"]);

        recent.remember(&topics[6..]);
        assert_eq!(recent.names(), &["t6", "t7"]);
    }
}
