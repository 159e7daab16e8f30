//! Feature extraction: one discovery record in, one feature record out.

use std::collections::HashSet;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::analyze::{code, signals, text};
use crate::batch::{map_items, Batch};
use crate::record::{Discovery, FeatureRecord, RecordError};

/// Minimum raw content length (chars) before code detection is attempted.
pub const MIN_CODE_CONTENT_LEN: usize = 100;

/// Substrings that suggest the raw content contains source code.
pub const CODE_INDICATORS: &[&str] = &["def ", "import ", "class ", "function"];

/// Weights of the estimated value blend.
pub mod value_weights {
    pub const POPULARITY: f64 = 0.3;
    pub const CODE_COMPLEXITY: f64 = 0.2;
    pub const AUTHOR: f64 = 0.2;
    pub const CODE_PRESENCE: f64 = 0.3;
    /// Code presence factor for text-only items
    pub const TEXT_ONLY: f64 = 0.3;
}

/// Stable identifier: source type plus the SHA-256 of the source URL.
pub fn loop_id(source_type: &str, source_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_url.as_bytes());
    format!("{}_{:x}", source_type, hasher.finalize())
}

/// Whether raw content looks like it contains code.
pub fn has_code(raw_content: &str) -> bool {
    raw_content.chars().count() > MIN_CODE_CONTENT_LEN
        && CODE_INDICATORS.iter().any(|i| raw_content.contains(i))
}

/// Weighted blend of the item's main signals, clamped to [0,1].
pub fn estimate_value(
    popularity: f64,
    code_complexity: f64,
    author_reputation: f64,
    has_code: bool,
) -> f64 {
    let presence = if has_code {
        1.0
    } else {
        value_weights::TEXT_ONLY
    };
    let value = popularity * value_weights::POPULARITY
        + code_complexity * value_weights::CODE_COMPLEXITY
        + author_reputation * value_weights::AUTHOR
        + presence * value_weights::CODE_PRESENCE;
    value.clamp(0.0, 1.0)
}

/// Derive the feature record for one discovery. Pure and total.
pub fn extract_features(discovery: &Discovery) -> FeatureRecord {
    let title = discovery.title();
    let description = &discovery.raw_content;
    let full_text = format!("{} {}", title, description);

    let has_code = has_code(description);
    let (code_language, code_complexity, code_lines) = if has_code {
        let language = code::detect_language(description);
        (
            Some(language),
            code::calculate_complexity(description, language),
            code::count_lines(description),
        )
    } else {
        (None, 0.0, 0)
    };

    let (primary_category, secondary_categories) = text::categorize(&full_text);

    let source = discovery.source_kind();
    let popularity_score = signals::calculate_popularity_score(&discovery.metadata, source);
    let author_reputation = signals::calculate_author_reputation(&discovery.metadata, source);
    let recency_score = signals::calculate_recency_score(&discovery.discovery_timestamp);

    FeatureRecord {
        loop_id: loop_id(&discovery.source_type, &discovery.source_url),
        source_url: discovery.source_url.clone(),
        source_type: discovery.source_type.clone(),
        has_code,
        code_language,
        code_complexity,
        code_lines,
        title_length: title.chars().count(),
        description_length: description.chars().count(),
        has_tutorial: text::has_tutorial_indicators(&full_text),
        has_documentation: text::has_documentation_indicators(&full_text),
        popularity_score,
        author_reputation,
        recency_score,
        primary_category,
        secondary_categories,
        keywords: text::extract_keywords(&full_text, text::MAX_KEYWORDS),
        // no separate automation taxonomy yet
        automation_type: primary_category,
        complexity_level: text::detect_complexity_level(&full_text),
        estimated_value: estimate_value(
            popularity_score,
            code_complexity,
            author_reputation,
            has_code,
        ),
    }
}

/// Decode raw discovery records, skipping malformed items and repeated
/// source URLs (the first occurrence wins).
pub fn decode_discoveries(raw: &[Value]) -> Batch<Discovery> {
    let mut batch = Batch::new(raw.len());
    let mut seen: HashSet<String> = HashSet::new();

    for (index, value) in raw.iter().enumerate() {
        let decoded = Discovery::from_value(value).and_then(|d| {
            if seen.insert(d.source_url.clone()) {
                Ok(d)
            } else {
                Err(RecordError::DuplicateSourceUrl(d.source_url))
            }
        });

        match decoded {
            Ok(discovery) => batch.items.push(discovery),
            Err(e) => {
                warn!(index, error = %e, "skipping discovery");
                batch.skip(index, e.to_string());
            }
        }
    }

    batch
}

/// Turns discovery collections into feature collections.
pub struct FeatureExtractor {
    parallel: bool,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor {
    /// Create an extractor, building the parser registry up front.
    pub fn new() -> Self {
        crate::parser::init();
        Self { parallel: true }
    }

    /// Set whether items are processed on the rayon pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn extract(&self, discovery: &Discovery) -> FeatureRecord {
        extract_features(discovery)
    }

    /// Extract features for already-decoded discoveries, in input order.
    pub fn extract_all(&self, discoveries: &[Discovery]) -> Vec<FeatureRecord> {
        map_items(discoveries, self.parallel, extract_features)
    }

    /// Decode and extract a raw discovery collection.
    ///
    /// Malformed items are logged and skipped; the batch reports how many of
    /// the inputs made it through.
    pub fn process_discoveries(&self, raw: &[Value]) -> Batch<FeatureRecord> {
        info!(count = raw.len(), "processing discoveries");

        let decoded = decode_discoveries(raw);
        let features = self.extract_all(&decoded.items);

        let batch = Batch {
            items: features,
            skipped: decoded.skipped,
            total: decoded.total,
        };

        info!("feature extraction complete: {}", batch.summary());
        batch
    }
}
