//! Domain vocabulary shared by every stage of the trend pipeline.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Social platform a post was collected from.
///
/// Unknown platform names are kept verbatim in [`Platform::Other`] and are
/// scored with the same formula as Reddit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    Twitter,
    Reddit,
    Other(String),
}

impl Platform {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Reddit => "reddit",
            Platform::Other(name) => name.as_str(),
        }
    }
}

impl From<&str> for Platform {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("twitter") {
            Platform::Twitter
        } else if trimmed.eq_ignore_ascii_case("reddit") {
            Platform::Reddit
        } else {
            Platform::Other(trimmed.to_lowercase())
        }
    }
}

impl From<String> for Platform {
    fn from(value: String) -> Self {
        Platform::from(value.as_str())
    }
}

impl From<Platform> for String {
    fn from(value: Platform) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-way sentiment classification stored alongside each processed post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "negative" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            other => Err(CoreError::InvalidSentimentLabel(other.to_string())),
        }
    }
}

/// Raw interaction counters as reported by the source platform.
///
/// Twitter posts populate `likes`/`retweets`; Reddit posts populate
/// `score`/`num_comments`. Unused counters are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounters {
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub retweets: i64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_known_names_case_insensitively() {
        assert_eq!(Platform::from("Twitter"), Platform::Twitter);
        assert_eq!(Platform::from(" reddit "), Platform::Reddit);
    }

    #[test]
    fn platform_keeps_unknown_names() {
        let platform = Platform::from("Mastodon");
        assert_eq!(platform, Platform::Other("mastodon".to_string()));
        assert_eq!(platform.as_str(), "mastodon");
    }

    #[test]
    fn platform_serializes_as_plain_string() {
        let json = serde_json::to_string(&Platform::Twitter).unwrap();
        assert_eq!(json, "\"twitter\"");
        let back: Platform = serde_json::from_str("\"reddit\"").unwrap();
        assert_eq!(back, Platform::Reddit);
    }

    #[test]
    fn sentiment_label_round_trips_through_str() {
        for label in SentimentLabel::ALL {
            assert_eq!(label.as_str().parse::<SentimentLabel>().unwrap(), label);
        }
    }

    #[test]
    fn sentiment_label_rejects_unknown() {
        let err = "meh".parse::<SentimentLabel>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidSentimentLabel(ref s) if s == "meh"));
    }

    #[test]
    fn counters_default_missing_fields_to_zero() {
        let counters: EngagementCounters = serde_json::from_str(r#"{"likes": 3}"#).unwrap();
        assert_eq!(
            counters,
            EngagementCounters {
                likes: 3,
                ..EngagementCounters::default()
            }
        );
    }
}
