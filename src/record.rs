//! Core record types flowing through the curation pipeline.
//!
//! Every record is immutable once built: a [`Discovery`] comes from an
//! external discovery collaborator, a [`FeatureRecord`] is derived from exactly
//! one discovery, and a [`QualityScore`] from exactly one feature record.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that cause a single record to be skipped.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("source_url is empty")]
    EmptySourceUrl,
    #[error("invalid discovery_timestamp {0:?}: expected ISO-8601")]
    InvalidTimestamp(String),
    #[error("duplicate source_url {0:?}")]
    DuplicateSourceUrl(String),
}

/// Known discovery sources with source-specific popularity metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Github,
    Reddit,
    Other,
}

impl SourceKind {
    pub fn parse(source_type: &str) -> Self {
        match source_type {
            "github" => SourceKind::Github,
            "reddit" => SourceKind::Reddit,
            _ => SourceKind::Other,
        }
    }
}

/// One raw item handed over by the discovery collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    pub source_url: String,
    pub source_type: String,
    pub content_type: String,
    pub raw_content: String,
    pub metadata: BTreeMap<String, Value>,
    pub discovery_timestamp: String,
}

impl Discovery {
    /// Decode and validate a discovery from its raw JSON form.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        let discovery: Discovery = serde_json::from_value(value.clone())?;

        if discovery.source_url.trim().is_empty() {
            return Err(RecordError::EmptySourceUrl);
        }
        if parse_timestamp(&discovery.discovery_timestamp).is_none() {
            return Err(RecordError::InvalidTimestamp(
                discovery.discovery_timestamp.clone(),
            ));
        }

        Ok(discovery)
    }

    pub fn source_kind(&self) -> SourceKind {
        SourceKind::parse(&self.source_type)
    }

    /// Metadata value as text. Numbers are rendered in decimal, other
    /// non-string values are treated as absent.
    pub fn metadata_text(&self, key: &str) -> Option<String> {
        metadata_text(&self.metadata, key)
    }

    /// The item title, empty when the source did not provide one.
    pub fn title(&self) -> String {
        self.metadata_text("title").unwrap_or_default()
    }
}

/// Read a metadata entry as text.
pub fn metadata_text(metadata: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    match metadata.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse an ISO-8601 timestamp, with or without offset, or a bare date.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Detected programming language of a code snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "python")]
    Python,
    #[serde(rename = "javascript")]
    JavaScript,
    #[serde(rename = "java")]
    Java,
    #[serde(rename = "c++")]
    Cpp,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::Cpp => "c++",
            Language::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Topic categories. The taxonomy order is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    WebScraping,
    DataProcessing,
    ApiWrapper,
    Automation,
    Bot,
    MlAi,
    WebDev,
    Devops,
    Security,
    Testing,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::WebScraping => "web_scraping",
            Category::DataProcessing => "data_processing",
            Category::ApiWrapper => "api_wrapper",
            Category::Automation => "automation",
            Category::Bot => "bot",
            Category::MlAi => "ml_ai",
            Category::WebDev => "web_dev",
            Category::Devops => "devops",
            Category::Security => "security",
            Category::Testing => "testing",
            Category::General => "general",
        }
    }

    /// Categories whose automation value is considered high.
    pub fn is_high_value(&self) -> bool {
        matches!(
            self,
            Category::Automation
                | Category::WebScraping
                | Category::ApiWrapper
                | Category::Bot
                | Category::DataProcessing
        )
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Difficulty tier estimated from the item's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Beginner,
    Intermediate,
    Advanced,
}

impl ComplexityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityTier::Beginner => "beginner",
            ComplexityTier::Intermediate => "intermediate",
            ComplexityTier::Advanced => "advanced",
        }
    }
}

/// Normalized attributes derived from one discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub loop_id: String,
    pub source_url: String,
    pub source_type: String,

    pub has_code: bool,
    pub code_language: Option<Language>,
    /// 0-1
    pub code_complexity: f64,
    pub code_lines: usize,

    pub title_length: usize,
    pub description_length: usize,
    pub has_tutorial: bool,
    pub has_documentation: bool,

    /// 0-1
    pub popularity_score: f64,
    /// 0-1
    pub author_reputation: f64,
    /// 0-1
    pub recency_score: f64,

    pub primary_category: Category,
    pub secondary_categories: Vec<Category>,
    pub keywords: Vec<String>,

    pub automation_type: Category,
    pub complexity_level: ComplexityTier,
    /// 0-1
    pub estimated_value: f64,
}

/// Curation decision for one loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
    NeedsReview,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
            Decision::NeedsReview => "needs_review",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quality decision and rationale for one feature record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub loop_id: String,
    /// 0-1
    pub overall_score: f64,
    pub approval_decision: Decision,
    /// 0-1
    pub confidence: f64,
    /// Signals in evaluation order, ending with a summary line
    pub reasoning: Vec<String>,
}

/// An approved loop joined back to everything it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovedLoop {
    pub loop_id: String,
    pub score: QualityScore,
    pub features: FeatureRecord,
    pub discovery: Discovery,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "source_url": "https://github.com/acme/tool",
            "source_type": "github",
            "content_type": "repository",
            "raw_content": "",
            "metadata": {"title": "Tool", "stars": 42},
            "discovery_timestamp": "2025-10-17T08:30:00.123456"
        })
    }

    #[test]
    fn test_decode_valid_discovery() {
        let d = Discovery::from_value(&valid()).unwrap();
        assert_eq!(d.source_kind(), SourceKind::Github);
        assert_eq!(d.title(), "Tool");
        assert_eq!(d.metadata_text("stars").as_deref(), Some("42"));
        assert_eq!(d.metadata_text("missing"), None);
    }

    #[test]
    fn test_decode_missing_field() {
        let mut v = valid();
        v.as_object_mut().unwrap().remove("raw_content");
        let err = Discovery::from_value(&v).unwrap_err();
        assert!(matches!(err, RecordError::Malformed(_)));
        assert!(err.to_string().contains("raw_content"));
    }

    #[test]
    fn test_decode_empty_url() {
        let mut v = valid();
        v["source_url"] = json!("  ");
        assert!(matches!(
            Discovery::from_value(&v),
            Err(RecordError::EmptySourceUrl)
        ));
    }

    #[test]
    fn test_decode_bad_timestamp() {
        let mut v = valid();
        v["discovery_timestamp"] = json!("yesterday");
        assert!(matches!(
            Discovery::from_value(&v),
            Err(RecordError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert!(parse_timestamp("2025-10-17T08:30:00Z").is_some());
        assert!(parse_timestamp("2025-10-17T08:30:00+02:00").is_some());
        assert!(parse_timestamp("2025-10-17T08:30:00").is_some());
        assert!(parse_timestamp("2025-10-17").is_some());
        assert!(parse_timestamp("17/10/2025").is_none());
    }

    #[test]
    fn test_enum_tags() {
        assert_eq!(serde_json::to_string(&Language::Cpp).unwrap(), "\"c++\"");
        assert_eq!(
            serde_json::to_string(&Category::WebScraping).unwrap(),
            "\"web_scraping\""
        );
        assert_eq!(
            serde_json::to_string(&Decision::NeedsReview).unwrap(),
            "\"needs_review\""
        );
        assert_eq!(Category::MlAi.as_str(), "ml_ai");
    }
}
