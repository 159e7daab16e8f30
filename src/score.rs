//! Heuristic quality scoring.
//!
//! Each feature record gets six sub-scores in [0,1], blended by the configured
//! weights into an overall score. The overall score alone decides between
//! approved, rejected and needs review.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::batch::{map_items, Batch};
use crate::config::{ConfigError, ScoringConfig, Thresholds, Weights};
use crate::record::{Category, Decision, FeatureRecord, QualityScore};

/// Sub-score constants.
pub mod points {
    /// Code sub-score for items without code
    pub const NO_CODE: f64 = 0.3;
    pub const CODE_COMPLEXITY_SHARE: f64 = 0.6;
    pub const CODE_LINES_SHARE: f64 = 0.4;
    /// Line count at which the line share saturates
    pub const CODE_LINES_SATURATION: f64 = 100.0;

    pub const LONG_DESCRIPTION: f64 = 0.4;
    pub const MEDIUM_DESCRIPTION: f64 = 0.25;
    pub const SHORT_DESCRIPTION: f64 = 0.1;
    pub const TUTORIAL_BONUS: f64 = 0.3;
    pub const DOCUMENTATION_BONUS: f64 = 0.3;

    pub const HIGH_VALUE_CATEGORY: f64 = 0.8;
    pub const OTHER_CATEGORY: f64 = 0.5;
    pub const GENERAL_CATEGORY: f64 = 0.3;
}

/// Description length bands (chars).
pub mod description {
    pub const DETAILED_MIN: usize = 200;
    pub const SHORT_MAX: usize = 50;
}

/// Popularity levels that earn a reasoning line.
pub mod popularity {
    pub const HIGH: f64 = 0.7;
    pub const LOW: f64 = 0.2;
}

/// Decision counts over a score collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringSummary {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub needs_review: usize,
    pub approval_rate: f64,
    pub rejection_rate: f64,
}

impl ScoringSummary {
    /// Reduce a score collection into counts and rates. Rates are 0 for an
    /// empty collection.
    pub fn from_scores(scores: &[QualityScore]) -> Self {
        let mut summary = ScoringSummary {
            total: scores.len(),
            ..Default::default()
        };

        for s in scores {
            match s.approval_decision {
                Decision::Approved => summary.approved += 1,
                Decision::Rejected => summary.rejected += 1,
                Decision::NeedsReview => summary.needs_review += 1,
            }
        }

        if summary.total > 0 {
            summary.approval_rate = summary.approved as f64 / summary.total as f64;
            summary.rejection_rate = summary.rejected as f64 / summary.total as f64;
        }
        summary
    }
}

/// Scores of a feature collection plus their summary.
#[derive(Debug, Clone)]
pub struct ScoringOutcome {
    pub batch: Batch<QualityScore>,
    pub summary: ScoringSummary,
}

/// Per-signal sub-scores for one feature record, each in [0,1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    pub popularity: f64,
    pub code_quality: f64,
    pub content_quality: f64,
    pub categorization: f64,
    pub recency: f64,
    pub author: f64,
}

impl SubScores {
    pub fn of(features: &FeatureRecord) -> Self {
        Self {
            popularity: features.popularity_score,
            code_quality: code_quality(features),
            content_quality: content_quality(features),
            categorization: categorization(features),
            recency: features.recency_score,
            author: features.author_reputation,
        }
    }

    /// Weighted blend, summed in a fixed order, clamped to [0,1].
    pub fn weighted(&self, w: &Weights) -> f64 {
        let total = self.popularity * w.popularity
            + self.code_quality * w.code_quality
            + self.content_quality * w.content_quality
            + self.categorization * w.categorization
            + self.recency * w.recency
            + self.author * w.author;
        total.clamp(0.0, 1.0)
    }
}

pub fn code_quality(f: &FeatureRecord) -> f64 {
    if !f.has_code {
        return points::NO_CODE;
    }
    let lines = (f.code_lines as f64 / points::CODE_LINES_SATURATION).min(1.0);
    (f.code_complexity * points::CODE_COMPLEXITY_SHARE + lines * points::CODE_LINES_SHARE).min(1.0)
}

pub fn content_quality(f: &FeatureRecord) -> f64 {
    let mut score = if f.description_length >= description::DETAILED_MIN {
        points::LONG_DESCRIPTION
    } else if f.description_length < description::SHORT_MAX {
        points::SHORT_DESCRIPTION
    } else {
        points::MEDIUM_DESCRIPTION
    };
    if f.has_tutorial {
        score += points::TUTORIAL_BONUS;
    }
    if f.has_documentation {
        score += points::DOCUMENTATION_BONUS;
    }
    score.min(1.0)
}

pub fn categorization(f: &FeatureRecord) -> f64 {
    if f.primary_category.is_high_value() {
        points::HIGH_VALUE_CATEGORY
    } else if f.primary_category == Category::General {
        points::GENERAL_CATEGORY
    } else {
        points::OTHER_CATEGORY
    }
}

/// Human-readable rationale, in evaluation order.
fn reasoning(f: &FeatureRecord, overall: f64, decision: Decision) -> Vec<String> {
    let mut lines = Vec::new();

    if f.popularity_score >= popularity::HIGH {
        lines.push(format!("High popularity (score: {:.2})", f.popularity_score));
    } else if f.popularity_score <= popularity::LOW {
        lines.push(format!("Low popularity (score: {:.2})", f.popularity_score));
    }

    if f.has_code {
        lines.push(format!("Contains code (complexity: {:.2})", f.code_complexity));
    } else {
        lines.push("No code detected".to_string());
    }

    if f.description_length >= description::DETAILED_MIN {
        lines.push("Detailed description".to_string());
    } else if f.description_length < description::SHORT_MAX {
        lines.push("Very short description".to_string());
    }
    if f.has_tutorial {
        lines.push("Has tutorial content".to_string());
    }
    if f.has_documentation {
        lines.push("Has documentation".to_string());
    }

    if f.primary_category.is_high_value() {
        lines.push(format!("High-value category: {}", f.primary_category));
    } else if f.primary_category == Category::General {
        lines.push("General category (unclear automation value)".to_string());
    }

    lines.push(format!("Overall score: {:.2} → {}", overall, decision));
    lines
}

/// Weighted quality scorer with configurable thresholds.
#[derive(Debug, Clone)]
pub struct Scorer {
    weights: Weights,
    thresholds: Thresholds,
    parallel: bool,
}

impl Default for Scorer {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            thresholds: Thresholds::default(),
            parallel: true,
        }
    }
}

impl Scorer {
    /// Build a scorer. Fails on invalid weights or thresholds.
    pub fn new(config: ScoringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            weights: config.weights,
            thresholds: config.thresholds,
            parallel: true,
        })
    }

    /// Set whether batches are scored on the rayon pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Decision and confidence for an overall score.
    ///
    /// Confidence is the normalized distance past the crossed threshold, and
    /// 0.5 for items left for review.
    pub fn decide(&self, overall: f64) -> (Decision, f64) {
        let Thresholds {
            approval,
            rejection,
        } = self.thresholds;

        if overall >= approval {
            let confidence = if approval >= 1.0 {
                1.0
            } else {
                (overall - approval) / (1.0 - approval)
            };
            (Decision::Approved, confidence.clamp(0.0, 1.0))
        } else if overall < rejection {
            // overall >= 0 here, so rejection > 0
            let confidence = (rejection - overall) / rejection;
            (Decision::Rejected, confidence.clamp(0.0, 1.0))
        } else {
            (Decision::NeedsReview, 0.5)
        }
    }

    /// Score one feature record. Pure: the same record always yields the
    /// same score.
    pub fn score(&self, features: &FeatureRecord) -> QualityScore {
        let overall = SubScores::of(features).weighted(&self.weights);
        let (decision, confidence) = self.decide(overall);

        QualityScore {
            loop_id: features.loop_id.clone(),
            overall_score: overall,
            approval_decision: decision,
            confidence,
            reasoning: reasoning(features, overall, decision),
        }
    }

    /// Score already-decoded feature records, in input order.
    pub fn score_features(&self, features: &[FeatureRecord]) -> Vec<QualityScore> {
        map_items(features, self.parallel, |f| self.score(f))
    }

    /// Decode and score a raw feature collection. Malformed records are
    /// logged and skipped.
    pub fn score_all(&self, raw: &[Value]) -> ScoringOutcome {
        info!(count = raw.len(), "scoring feature records");

        let mut decoded: Batch<FeatureRecord> = Batch::new(raw.len());
        for (index, value) in raw.iter().enumerate() {
            match serde_json::from_value::<FeatureRecord>(value.clone()) {
                Ok(f) => decoded.items.push(f),
                Err(e) => {
                    warn!(index, error = %e, "skipping feature record");
                    decoded.skip(index, format!("malformed record: {}", e));
                }
            }
        }

        let batch = Batch {
            items: self.score_features(&decoded.items),
            skipped: decoded.skipped,
            total: decoded.total,
        };
        let summary = ScoringSummary::from_scores(&batch.items);

        info!(
            approved = summary.approved,
            rejected = summary.rejected,
            needs_review = summary.needs_review,
            "quality scoring complete: {}",
            batch.summary()
        );

        ScoringOutcome { batch, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ComplexityTier, Language};
    use proptest::prelude::*;

    fn features() -> FeatureRecord {
        FeatureRecord {
            loop_id: "github_abc".to_string(),
            source_url: "https://github.com/acme/tool".to_string(),
            source_type: "github".to_string(),
            has_code: true,
            code_language: Some(Language::Python),
            code_complexity: 0.5,
            code_lines: 150,
            title_length: 20,
            description_length: 500,
            has_tutorial: true,
            has_documentation: true,
            popularity_score: 0.8,
            author_reputation: 0.6,
            recency_score: 1.0,
            primary_category: Category::Automation,
            secondary_categories: vec![Category::WebScraping],
            keywords: vec!["automation".to_string()],
            automation_type: Category::Automation,
            complexity_level: ComplexityTier::Intermediate,
            estimated_value: 0.7,
        }
    }

    fn weak_features() -> FeatureRecord {
        FeatureRecord {
            has_code: false,
            code_language: None,
            code_complexity: 0.0,
            code_lines: 0,
            description_length: 10,
            has_tutorial: false,
            has_documentation: false,
            popularity_score: 0.0,
            author_reputation: 0.3,
            primary_category: Category::General,
            secondary_categories: vec![],
            automation_type: Category::General,
            ..features()
        }
    }

    #[test]
    fn test_sub_scores() {
        let f = features();
        assert!((code_quality(&f) - 0.7).abs() < 1e-12);
        assert_eq!(content_quality(&f), 1.0);
        assert_eq!(categorization(&f), points::HIGH_VALUE_CATEGORY);

        let w = weak_features();
        assert_eq!(code_quality(&w), points::NO_CODE);
        assert_eq!(content_quality(&w), points::SHORT_DESCRIPTION);
        assert_eq!(categorization(&w), points::GENERAL_CATEGORY);

        let other = FeatureRecord {
            primary_category: Category::Security,
            description_length: 120,
            ..weak_features()
        };
        assert_eq!(categorization(&other), points::OTHER_CATEGORY);
        assert_eq!(content_quality(&other), points::MEDIUM_DESCRIPTION);
    }

    #[test]
    fn test_high_quality_is_approved() {
        let score = Scorer::default().score(&features());

        // .8*.25 + .7*.2 + 1*.2 + .8*.15 + 1*.1 + .6*.1 = 0.82
        assert!((score.overall_score - 0.82).abs() < 1e-9);
        assert_eq!(score.approval_decision, Decision::Approved);
        assert!((score.confidence - 0.55).abs() < 1e-9);
        assert_eq!(
            score.reasoning,
            vec![
                "High popularity (score: 0.80)",
                "Contains code (complexity: 0.50)",
                "Detailed description",
                "Has tutorial content",
                "Has documentation",
                "High-value category: automation",
                "Overall score: 0.82 → approved",
            ]
        );
    }

    #[test]
    fn test_low_quality_is_rejected() {
        let score = Scorer::default().score(&weak_features());

        // .3*.2 + .1*.2 + .3*.15 + 1*.1 + .3*.1 = 0.255
        assert!((score.overall_score - 0.255).abs() < 1e-9);
        assert_eq!(score.approval_decision, Decision::Rejected);
        assert!((score.confidence - (0.35 - 0.255) / 0.35).abs() < 1e-9);
        assert_eq!(score.reasoning[0], "Low popularity (score: 0.00)");
        assert_eq!(score.reasoning[1], "No code detected");
        assert_eq!(score.reasoning[2], "Very short description");
        assert_eq!(
            score.reasoning[3],
            "General category (unclear automation value)"
        );
        assert_eq!(
            score.reasoning.last().unwrap(),
            &format!("Overall score: {:.2} → rejected", score.overall_score)
        );
    }

    #[test]
    fn test_middle_band_needs_review() {
        let scorer = Scorer::default();
        assert_eq!(scorer.decide(0.5), (Decision::NeedsReview, 0.5));
        assert_eq!(scorer.decide(0.35).0, Decision::NeedsReview);
        assert_eq!(scorer.decide(0.6).0, Decision::Approved);
        assert_eq!(scorer.decide(0.6).1, 0.0);
        assert_eq!(scorer.decide(1.0), (Decision::Approved, 1.0));
        assert_eq!(scorer.decide(0.0), (Decision::Rejected, 1.0));
    }

    #[test]
    fn test_custom_thresholds() {
        let scorer = Scorer::new(ScoringConfig {
            thresholds: Thresholds {
                approval: 1.0,
                rejection: 0.0,
            },
            ..Default::default()
        })
        .unwrap();
        assert_eq!(scorer.decide(1.0), (Decision::Approved, 1.0));
        assert_eq!(scorer.decide(0.0).0, Decision::NeedsReview);
    }

    #[test]
    fn test_invalid_config_refused() {
        let config = ScoringConfig {
            thresholds: Thresholds {
                approval: 0.3,
                rejection: 0.6,
            },
            ..Default::default()
        };
        assert!(Scorer::new(config).is_err());
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let scorer = Scorer::default();
        let a = serde_json::to_string(&scorer.score(&features())).unwrap();
        let b = serde_json::to_string(&scorer.score(&features())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_summary_counts() {
        let scorer = Scorer::default();
        let scores = vec![
            scorer.score(&features()),
            scorer.score(&weak_features()),
            scorer.score(&features()),
        ];
        let summary = ScoringSummary::from_scores(&scores);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.approved, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.needs_review, 0);
        assert!((summary.approval_rate - 2.0 / 3.0).abs() < 1e-12);

        let empty = ScoringSummary::from_scores(&[]);
        assert_eq!(empty.total, 0);
        assert_eq!(empty.approval_rate, 0.0);
        assert_eq!(empty.rejection_rate, 0.0);
    }

    #[test]
    fn test_score_all_skips_malformed() {
        let raw = vec![
            serde_json::to_value(features()).unwrap(),
            serde_json::json!({"loop_id": "broken"}),
            serde_json::to_value(weak_features()).unwrap(),
        ];
        let outcome = Scorer::default().score_all(&raw);
        assert_eq!(outcome.batch.processed(), 2);
        assert_eq!(outcome.batch.skipped.len(), 1);
        assert_eq!(outcome.batch.skipped[0].index, 1);
        assert_eq!(outcome.batch.summary(), "2 of 3 processed successfully");
        assert_eq!(outcome.summary.total, 2);
    }

    proptest! {
        #[test]
        fn decision_partition_is_exhaustive(
            overall in 0.0f64..=1.0,
            rejection in 0.0f64..0.5,
            gap in 0.01f64..0.5,
        ) {
            let scorer = Scorer::new(ScoringConfig {
                thresholds: Thresholds { approval: rejection + gap, rejection },
                ..Default::default()
            }).unwrap();
            let (decision, confidence) = scorer.decide(overall);

            let expected = if overall >= rejection + gap {
                Decision::Approved
            } else if overall < rejection {
                Decision::Rejected
            } else {
                Decision::NeedsReview
            };
            prop_assert_eq!(decision, expected);
            prop_assert!((0.0..=1.0).contains(&confidence));
        }

        #[test]
        fn scores_stay_in_range(
            popularity in 0.0f64..=1.0,
            complexity in 0.0f64..=1.0,
            lines in 0usize..10_000,
            description in 0usize..5_000,
            author in 0.0f64..=1.0,
            has_code in any::<bool>(),
            has_tutorial in any::<bool>(),
        ) {
            let f = FeatureRecord {
                popularity_score: popularity,
                code_complexity: complexity,
                code_lines: lines,
                description_length: description,
                author_reputation: author,
                has_code,
                has_tutorial,
                ..features()
            };
            let score = Scorer::default().score(&f);
            prop_assert!((0.0..=1.0).contains(&score.overall_score));
            prop_assert!((0.0..=1.0).contains(&score.confidence));
            prop_assert!(score.reasoning.last().unwrap().starts_with("Overall score:"));
        }
    }
}
