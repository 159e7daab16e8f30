//! Signal analyzers that feed the feature extractor.
//!
//! - `code`: language detection and structural complexity
//! - `text`: keywords, taxonomy categories, difficulty tier
//! - `signals`: popularity, author reputation, recency

pub mod code;
pub mod signals;
pub mod text;

pub use code::{calculate_complexity, count_lines, detect_language, LexicalRule, LANGUAGE_RULES};
pub use signals::{
    calculate_author_reputation, calculate_popularity_score, calculate_recency_score,
};
pub use text::{
    categorize, detect_complexity_level, extract_keywords, has_documentation_indicators,
    has_tutorial_indicators, MAX_KEYWORDS, TAXONOMY,
};
