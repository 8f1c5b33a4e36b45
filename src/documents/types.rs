use chrono::DateTime;
use serde::{Deserialize, Deserializer};

// ============================================================================
// Published Date
// ============================================================================

/// Timestamps at or above this magnitude are treated as milliseconds.
/// 1e11 seconds is the year 5138; 1e11 milliseconds is March 1973.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Loosely typed publication date as delivered by the reader service.
///
/// The service sends either a numeric epoch timestamp, a date string, or null.
/// It is normalized once at deserialization via [`PublishedDate::display`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishedDate {
    Unknown,
    Text(String),
    Numeric(i64),
}

impl PublishedDate {
    /// Classify a raw JSON value. Never fails: unsupported shapes become `Unknown`.
    pub fn from_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64))
                .map_or(Self::Unknown, Self::Numeric),
            serde_json::Value::String(s) if !s.trim().is_empty() => Self::Text(s.trim().to_string()),
            _ => Self::Unknown,
        }
    }

    /// Display form: `YYYY-MM-DD` when the value is a recognizable timestamp,
    /// the raw text or number otherwise, empty when unknown.
    pub fn display(&self) -> String {
        match self {
            Self::Unknown => String::new(),
            Self::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|_| s.clone()),
            Self::Numeric(n) => {
                let parsed = if n.abs() >= MILLIS_THRESHOLD {
                    DateTime::from_timestamp_millis(*n)
                } else {
                    DateTime::from_timestamp(*n, 0)
                };
                parsed
                    .map(|dt| dt.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| n.to_string())
            }
        }
    }
}

impl<'de> Deserialize<'de> for PublishedDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

fn published_display<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    PublishedDate::deserialize(deserializer).map(|date| date.display())
}

/// Treat explicit JSON `null` the same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ============================================================================
// Document
// ============================================================================

/// A document stored in the reader service.
///
/// Immutable after deserialization; a refresh replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Document {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub author: String,
    #[serde(deserialize_with = "nullable")]
    pub summary: String,
    /// Full body, usually HTML. Empty when the service has none.
    #[serde(deserialize_with = "nullable")]
    pub html_content: String,
    /// Location tag: new, later, archive, feed, shortlist, or anything else.
    #[serde(deserialize_with = "nullable")]
    pub location: String,
    /// Kind of document (article, email, pdf, ...). Not used for grouping.
    #[serde(deserialize_with = "nullable")]
    pub category: String,
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    #[serde(deserialize_with = "nullable")]
    pub source_url: String,
    #[serde(deserialize_with = "nullable")]
    pub word_count: u64,
    /// Already normalized display string, see [`PublishedDate::display`].
    #[serde(deserialize_with = "published_display")]
    pub published_date: String,
}

impl Document {
    /// Documents with a blank title are excluded from every view.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
    }
}
