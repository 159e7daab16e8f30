//! Text signals: keywords, topic categories, difficulty tier and
//! tutorial/documentation markers.
//!
//! All matching is case-insensitive substring containment against fixed,
//! ordered tables. Table order is significant: it breaks ties between
//! categories and decides which difficulty tier is checked first.

use std::collections::HashMap;

use lazy_static::lazy_static;
use phf::phf_set;
use regex::Regex;

use crate::record::{Category, ComplexityTier};

/// Default number of keywords kept per item.
pub const MAX_KEYWORDS: usize = 10;

/// Maximum number of secondary categories.
pub const MAX_SECONDARY: usize = 3;

lazy_static! {
    /// Lower-case words of three or more letters.
    static ref WORD_PATTERN: Regex = Regex::new(r"\b[a-z]{3,}\b").unwrap();
}

static STOP_WORDS: phf::Set<&'static str> = phf_set! {
    "the", "and", "for", "with", "this", "that", "from", "have", "are", "was",
};

/// Topic taxonomy in tie-break order.
pub static TAXONOMY: &[(Category, &[&str])] = &[
    (
        Category::WebScraping,
        &["scrape", "scraping", "crawler", "spider", "beautifulsoup", "selenium"],
    ),
    (
        Category::DataProcessing,
        &["pandas", "numpy", "data", "csv", "excel", "dataframe"],
    ),
    (
        Category::ApiWrapper,
        &["api", "rest", "endpoint", "wrapper", "client", "sdk"],
    ),
    (
        Category::Automation,
        &["automate", "automation", "workflow", "task", "schedule"],
    ),
    (
        Category::Bot,
        &["bot", "chatbot", "telegram", "discord", "slack"],
    ),
    (
        Category::MlAi,
        &[
            "machine learning",
            "ai",
            "neural",
            "model",
            "training",
            "tensorflow",
            "pytorch",
        ],
    ),
    (
        Category::WebDev,
        &["flask", "django", "fastapi", "web", "server", "frontend"],
    ),
    (
        Category::Devops,
        &["docker", "kubernetes", "ci/cd", "deployment", "infrastructure"],
    ),
    (
        Category::Security,
        &["security", "encryption", "authentication", "oauth", "jwt"],
    ),
    (
        Category::Testing,
        &["test", "testing", "pytest", "unittest", "qa"],
    ),
];

/// Difficulty tiers in the order they are checked.
pub static TIER_KEYWORDS: &[(ComplexityTier, &[&str])] = &[
    (
        ComplexityTier::Beginner,
        &["simple", "basic", "beginner", "tutorial", "learn", "intro"],
    ),
    (
        ComplexityTier::Intermediate,
        &["intermediate", "moderate", "practical", "real-world"],
    ),
    (
        ComplexityTier::Advanced,
        &["advanced", "complex", "production", "scalable", "enterprise"],
    ),
];

const TUTORIAL_MARKERS: &[&str] = &[
    "tutorial",
    "how to",
    "guide",
    "step by step",
    "learn",
    "walkthrough",
];

const DOCUMENTATION_MARKERS: &[&str] = &[
    "documentation",
    "docs",
    "readme",
    "api reference",
    "manual",
];

fn contains_any(text_lower: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text_lower.contains(m))
}

/// Most frequent non-stop-words, ties kept in first-seen order.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    let lower = text.to_lowercase();

    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for word in WORD_PATTERN.find_iter(&lower).map(|m| m.as_str()) {
        if STOP_WORDS.contains(word) {
            continue;
        }
        match index.get(word) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(word, counts.len());
                counts.push((word, 1));
            }
        }
    }

    // sort_by is stable, so equal counts keep first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(max_keywords)
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Primary category plus up to three secondary categories.
///
/// Returns `(General, [])` when no taxonomy keyword is present.
pub fn categorize(text: &str) -> (Category, Vec<Category>) {
    let lower = text.to_lowercase();

    let mut scored: Vec<(Category, usize)> = TAXONOMY
        .iter()
        .map(|(category, keywords)| {
            let score = keywords.iter().filter(|k| lower.contains(*k)).count();
            (*category, score)
        })
        .filter(|(_, score)| *score > 0)
        .collect();

    if scored.is_empty() {
        return (Category::General, Vec::new());
    }

    scored.sort_by(|a, b| b.1.cmp(&a.1));

    let primary = scored[0].0;
    let secondary = scored
        .iter()
        .skip(1)
        .take(MAX_SECONDARY)
        .map(|(category, _)| *category)
        .collect();

    (primary, secondary)
}

/// First tier with a keyword match, `Intermediate` when none match.
pub fn detect_complexity_level(text: &str) -> ComplexityTier {
    let lower = text.to_lowercase();
    TIER_KEYWORDS
        .iter()
        .find(|(_, keywords)| contains_any(&lower, keywords))
        .map(|(tier, _)| *tier)
        .unwrap_or(ComplexityTier::Intermediate)
}

pub fn has_tutorial_indicators(text: &str) -> bool {
    contains_any(&text.to_lowercase(), TUTORIAL_MARKERS)
}

pub fn has_documentation_indicators(text: &str) -> bool {
    contains_any(&text.to_lowercase(), DOCUMENTATION_MARKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_keywords() {
        let keywords = extract_keywords(
            "This is a test automation script for web scraping",
            MAX_KEYWORDS,
        );
        assert_eq!(
            keywords,
            vec!["test", "automation", "script", "web", "scraping"]
        );
    }

    #[test]
    fn test_keywords_ranked_by_frequency_then_first_seen() {
        let keywords = extract_keywords("beta alpha beta gamma alpha beta delta", 3);
        assert_eq!(keywords, vec!["beta", "alpha", "gamma"]);
    }

    #[test]
    fn test_keywords_limit_and_filtering() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let keywords = extract_keywords(text, MAX_KEYWORDS);
        assert_eq!(keywords.len(), 10);
        assert_eq!(keywords[0], "one");

        // too short, stop words, digits
        assert!(extract_keywords("a an the and is 1234", MAX_KEYWORDS).is_empty());
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            extract_keywords("Python PYTHON python", MAX_KEYWORDS),
            vec!["python"]
        );
    }

    #[test]
    fn test_categorize_automation() {
        let (primary, _) = categorize("Automate your workflow with this script");
        assert_eq!(primary, Category::Automation);
    }

    #[test]
    fn test_categorize_web_scraping() {
        let (primary, secondary) = categorize("BeautifulSoup scraper for extracting data");
        assert_eq!(primary, Category::WebScraping);
        assert_eq!(secondary, vec![Category::DataProcessing]);
    }

    #[test]
    fn test_categorize_general() {
        assert_eq!(categorize("hello world"), (Category::General, vec![]));
        assert_eq!(categorize(""), (Category::General, vec![]));
    }

    #[test]
    fn test_categorize_ties_follow_taxonomy_order() {
        // one keyword each for bot, web_scraping, devops, security, testing
        let (primary, secondary) = categorize("slack qa docker jwt crawler");
        assert_eq!(primary, Category::WebScraping);
        assert_eq!(
            secondary,
            vec![Category::Bot, Category::Devops, Category::Security]
        );
    }

    #[test]
    fn test_detect_complexity_beginner() {
        assert_eq!(
            detect_complexity_level("Simple tutorial for beginners to learn Python"),
            ComplexityTier::Beginner
        );
    }

    #[test]
    fn test_detect_complexity_advanced() {
        assert_eq!(
            detect_complexity_level("Advanced production-ready scalable system"),
            ComplexityTier::Advanced
        );
    }

    #[test]
    fn test_detect_complexity_order_and_default() {
        // beginner is checked before advanced
        assert_eq!(
            detect_complexity_level("a basic but scalable approach"),
            ComplexityTier::Beginner
        );
        assert_eq!(
            detect_complexity_level("nothing notable"),
            ComplexityTier::Intermediate
        );
    }

    #[test]
    fn test_has_tutorial_indicators() {
        assert!(has_tutorial_indicators("Step by step tutorial"));
        assert!(has_tutorial_indicators("How to build a bot"));
        assert!(!has_tutorial_indicators("Random text"));
    }

    #[test]
    fn test_has_documentation_indicators() {
        assert!(has_documentation_indicators("See the documentation"));
        assert!(has_documentation_indicators("API reference manual"));
        assert!(!has_documentation_indicators("Random text"));
    }
}
