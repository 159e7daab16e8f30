//! Popularity, author reputation and recency signals.
//!
//! Each signal maps noisy, source-specific metadata onto [0,1]. Unparseable
//! values degrade to zero rather than failing the item.

use std::collections::BTreeMap;

use phf::phf_set;
use serde_json::Value;

use crate::record::{metadata_text, SourceKind};

/// Star count at which GitHub popularity saturates.
pub const GITHUB_STAR_SATURATION: f64 = 1000.0;

/// Upvote count at which Reddit popularity saturates.
pub const REDDIT_UPVOTE_SATURATION: f64 = 100.0;

/// Popularity for sources without engagement metadata.
pub const DEFAULT_POPULARITY: f64 = 0.5;

pub const LOW_SIGNAL_REPUTATION: f64 = 0.3;
pub const DEFAULT_REPUTATION: f64 = 0.6;

/// Authors whose posts carry little signal. Empty means unknown.
static LOW_SIGNAL_AUTHORS: phf::Set<&'static str> = phf_set! {
    "AutoModerator", "unknown", "",
};

/// Popularity in [0,1] from stars (GitHub) or upvotes (Reddit).
pub fn calculate_popularity_score(metadata: &BTreeMap<String, Value>, source: SourceKind) -> f64 {
    match source {
        SourceKind::Github => {
            let stars = metadata_text(metadata, "stars")
                .map(|s| leading_count(&s))
                .unwrap_or(0);
            (stars as f64 / GITHUB_STAR_SATURATION).min(1.0)
        }
        SourceKind::Reddit => {
            let upvotes = metadata_text(metadata, "upvotes")
                .map(|s| exact_count(&s))
                .unwrap_or(0);
            (upvotes as f64 / REDDIT_UPVOTE_SATURATION).min(1.0)
        }
        SourceKind::Other => DEFAULT_POPULARITY,
    }
}

/// Author reputation in [0,1].
///
/// Placeholder: a small blocklist gets a low constant, everyone else a
/// moderate one. Meant to be replaced once real reputation data (account age,
/// karma, follower counts) is available from the sources.
pub fn calculate_author_reputation(metadata: &BTreeMap<String, Value>, _source: SourceKind) -> f64 {
    let author = metadata_text(metadata, "author").unwrap_or_default();
    if LOW_SIGNAL_AUTHORS.contains(author.as_str()) {
        LOW_SIGNAL_REPUTATION
    } else {
        DEFAULT_REPUTATION
    }
}

/// Recency in [0,1].
///
/// Every discovery is scored right after it was scraped, so this is 1.0 for
/// now. The timestamp parameter stays so a time-decay policy can slot in
/// without touching callers.
pub fn calculate_recency_score(_timestamp: &str) -> f64 {
    1.0
}

/// Code points of the zero digit of every Unicode decimal digit (`Nd`) run,
/// as of Unicode 15. Each run holds the ten digits 0-9 in order.
const DECIMAL_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x10D30, 0x11066, 0x110F0, 0x11136, 0x111D0,
    0x112F0, 0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730, 0x118E0, 0x11950, 0x11C50, 0x11D50,
    0x11DA0, 0x11F50, 0x16A60, 0x16AC0, 0x16B50, 0x1D7CE, 0x1D7D8, 0x1D7E2, 0x1D7EC, 0x1D7F6,
    0x1E140, 0x1E2F0, 0x1E4F0, 0x1E950, 0x1FBF0,
];

/// Value of a decimal digit in any script: '7' and '٧' are both 7.
fn decimal_value(c: char) -> Option<u64> {
    let code = c as u32;
    let run = DECIMAL_ZEROS.partition_point(|&zero| zero <= code);
    let zero = DECIMAL_ZEROS[run.checked_sub(1)?];
    let value = code - zero;
    (value < 10).then_some(value as u64)
}

/// Number in the first whitespace-separated token, ignoring non-digits:
/// "1,150 stars this week" -> 1150.
fn leading_count(text: &str) -> u64 {
    let token = text.split_whitespace().next().unwrap_or("");
    fold_digits(token.chars().filter_map(decimal_value))
}

/// Number when the whole text is decimal digits, otherwise 0.
fn exact_count(text: &str) -> u64 {
    let digits: Option<Vec<u64>> = text.chars().map(decimal_value).collect();
    match digits {
        Some(digits) => fold_digits(digits.into_iter()),
        None => 0,
    }
}

/// Combine digit values into a number, saturating on overflow. No digits
/// is 0.
fn fold_digits(digits: impl Iterator<Item = u64>) -> u64 {
    digits.fold(0u64, |n, d| n.saturating_mul(10).saturating_add(d))
}
