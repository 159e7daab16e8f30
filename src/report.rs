//! Output formatting for curation results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::batch::{Batch, SkippedItem};
use crate::pipeline::{PipelineStatus, RunOutcome, RunStats};
use crate::record::{ApprovedLoop, Category, Decision, FeatureRecord, QualityScore};
use crate::score::ScoringOutcome;

/// Estimated value bands.
pub mod value_bands {
    pub const HIGH: f64 = 0.7;
    pub const MEDIUM: f64 = 0.4;
}

/// Number of approved loops shown in the scoring summary.
pub const SAMPLE_APPROVED: usize = 5;

/// Reasoning lines shown per sample loop.
pub const SAMPLE_REASONING: usize = 3;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pretty,
    Json,
}

impl std::str::FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Format::Pretty),
            "json" => Ok(Format::Json),
            other => anyhow::bail!("invalid format {:?}, must be 'pretty' or 'json'", other),
        }
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// Count of feature records per estimated value band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl ValueDistribution {
    pub fn from_features(features: &[FeatureRecord]) -> Self {
        let mut dist = ValueDistribution::default();
        for f in features {
            if f.estimated_value >= value_bands::HIGH {
                dist.high += 1;
            } else if f.estimated_value >= value_bands::MEDIUM {
                dist.medium += 1;
            } else {
                dist.low += 1;
            }
        }
        dist
    }
}

/// Feature records per primary category, most frequent first. Ties keep
/// taxonomy order.
pub fn category_breakdown(features: &[FeatureRecord]) -> Vec<(Category, usize)> {
    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    for f in features {
        *counts.entry(f.primary_category).or_insert(0) += 1;
    }
    let mut breakdown: Vec<(Category, usize)> = counts.into_iter().collect();
    breakdown.sort_by(|a, b| b.1.cmp(&a.1));
    breakdown
}

/// JSON report for the extraction stage.
#[derive(Serialize, Deserialize)]
pub struct ExtractionReport {
    pub version: String,
    pub total: usize,
    pub processed: usize,
    pub skipped: Vec<SkippedItem>,
    pub categories: BTreeMap<String, usize>,
    pub value_distribution: ValueDistribution,
}

impl ExtractionReport {
    pub fn new(batch: &Batch<FeatureRecord>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            total: batch.total,
            processed: batch.processed(),
            skipped: batch.skipped.clone(),
            categories: category_breakdown(&batch.items)
                .into_iter()
                .map(|(c, n)| (c.to_string(), n))
                .collect(),
            value_distribution: ValueDistribution::from_features(&batch.items),
        }
    }
}

pub fn write_extraction_json(batch: &Batch<FeatureRecord>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&ExtractionReport::new(batch))?;
    println!("{}", json);
    Ok(())
}

pub fn write_extraction_pretty(batch: &Batch<FeatureRecord>) {
    write_header("Feature extraction");
    write_batch_line(batch);
    println!();

    let breakdown = category_breakdown(&batch.items);
    if !breakdown.is_empty() {
        println!("  {}", "Category breakdown:".bold());
        for (category, count) in &breakdown {
            println!("    {:<20} {:>4}", category.as_str(), count);
        }
        println!();
    }

    let dist = ValueDistribution::from_features(&batch.items);
    println!("  {}", "Value distribution:".bold());
    println!("    {:<20} {:>4}", "high (>= 0.7)".green(), dist.high);
    println!("    {:<20} {:>4}", "medium (0.4-0.7)".yellow(), dist.medium);
    println!("    {:<20} {:>4}", "low (< 0.4)".red(), dist.low);
    println!();

    write_skipped(&batch.skipped);
}

// =============================================================================
// Scoring
// =============================================================================

/// JSON report for the scoring stage.
#[derive(Serialize, Deserialize)]
pub struct ScoringReport {
    pub version: String,
    pub total: usize,
    pub processed: usize,
    pub skipped: Vec<SkippedItem>,
    pub summary: crate::score::ScoringSummary,
}

pub fn write_scoring_json(outcome: &ScoringOutcome) -> anyhow::Result<()> {
    let report = ScoringReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        total: outcome.batch.total,
        processed: outcome.batch.processed(),
        skipped: outcome.batch.skipped.clone(),
        summary: outcome.summary.clone(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn write_scoring_pretty(outcome: &ScoringOutcome) {
    write_header("Quality scoring");
    write_batch_line(&outcome.batch);
    println!();

    let s = &outcome.summary;
    println!("  {}", "Decisions:".bold());
    println!(
        "    {:<20} {:>4}  ({:.1}%)",
        "approved".green(),
        s.approved,
        s.approval_rate * 100.0
    );
    println!(
        "    {:<20} {:>4}  ({:.1}%)",
        "rejected".red(),
        s.rejected,
        s.rejection_rate * 100.0
    );
    println!("    {:<20} {:>4}", "needs_review".yellow(), s.needs_review);
    println!();

    let samples: Vec<&QualityScore> = outcome
        .batch
        .items
        .iter()
        .filter(|q| q.approval_decision == Decision::Approved)
        .take(SAMPLE_APPROVED)
        .collect();
    if !samples.is_empty() {
        println!("  {}", "Sample approved loops:".bold());
        for q in samples {
            write_score_sample(q);
        }
        println!();
    }

    write_skipped(&outcome.batch.skipped);
}

fn write_score_sample(q: &QualityScore) {
    print!("    {}", q.loop_id.blue());
    println!(
        "  {}",
        format!(
            "score {:.2}, confidence {:.2}",
            q.overall_score, q.confidence
        )
        .dimmed()
    );
    for line in q.reasoning.iter().take(SAMPLE_REASONING) {
        println!("      - {}", line);
    }
}

// =============================================================================
// Pipeline run
// =============================================================================

/// JSON report for a full run.
#[derive(Serialize, Deserialize)]
pub struct RunReport {
    pub version: String,
    pub stats: RunStats,
    pub approved: Vec<String>,
}

pub fn write_run_json(outcome: &RunOutcome) -> anyhow::Result<()> {
    let report = RunReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        stats: outcome.stats.clone(),
        approved: outcome.approved.iter().map(|a| a.loop_id.clone()).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn write_run_pretty(outcome: &RunOutcome, data_dir: &str) {
    let stats = &outcome.stats;

    write_header("Pipeline run");
    print!("  {}", "Data dir: ".dimmed());
    println!("{}", data_dir);
    println!();

    match stats.pipeline_status {
        PipelineStatus::Success => print!("  {}", "✓ SUCCESS".green()),
        PipelineStatus::PartialFailure => print!("  {}", "! PARTIAL FAILURE".yellow()),
    }
    println!("  {}", format!("{:.2}s", stats.duration_seconds).dimmed());
    println!();

    println!("  {}", "Stages:".bold());
    println!("    {:<20} {:>4}", "discoveries", stats.discoveries);
    println!(
        "    {:<20} {:>4}{}",
        "features extracted",
        stats.features_extracted,
        skipped_suffix(stats.skipped.feature_extraction)
    );
    println!("    {:<20} {:>4}", "scored", stats.scores);
    println!(
        "    {:<20} {:>4}  ({:.1}%)",
        "approved",
        stats.approved_loops,
        stats.approval_rate * 100.0
    );
    println!();

    if !stats.stage_errors.is_empty() {
        println!("  {} ({}):", "Stage errors".bold(), stats.stage_errors.len());
        for e in &stats.stage_errors {
            println!("    {} {}", format!("[{}]", e.stage).red(), e.message);
        }
        println!();
    }

    if !outcome.approved.is_empty() {
        println!("  {}", "Approved loops:".bold());
        for a in outcome.approved.iter().take(SAMPLE_APPROVED) {
            write_approved_line(a);
        }
        if outcome.approved.len() > SAMPLE_APPROVED {
            println!(
                "    {}",
                format!("... and {} more", outcome.approved.len() - SAMPLE_APPROVED).dimmed()
            );
        }
        println!();
    }
}

fn write_approved_line(a: &ApprovedLoop) {
    let title = a.discovery.title();
    let label = if title.is_empty() {
        a.discovery.source_url.as_str()
    } else {
        title.as_str()
    };
    println!(
        "    {:.2}  {:<16} {}",
        a.score.overall_score,
        a.features.primary_category.as_str(),
        label
    );
}

// =============================================================================
// Shared
// =============================================================================

fn write_header(stage: &str) {
    println!();
    print!("  ");
    print!("{}", "loopcurate".cyan().bold());
    println!(" v{}  {}", env!("CARGO_PKG_VERSION"), stage.dimmed());
    println!();
}

fn write_batch_line<T>(batch: &Batch<T>) {
    if batch.is_complete() {
        println!("  {} {}", "✓".green(), batch.summary());
    } else {
        println!("  {} {}", "!".yellow(), batch.summary());
    }
}

fn write_skipped(skipped: &[SkippedItem]) {
    if skipped.is_empty() {
        return;
    }
    println!("  {} ({}):", "Skipped".bold(), skipped.len());
    for s in skipped {
        println!("    {} {}", format!("#{}", s.index).dimmed(), s.reason);
    }
    println!();
}

fn skipped_suffix(count: usize) -> String {
    if count == 0 {
        String::new()
    } else {
        format!("  ({} skipped)", count).dimmed().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_features;
    use crate::record::Discovery;
    use serde_json::json;

    fn feature(content: &str, value: f64) -> FeatureRecord {
        let d = Discovery::from_value(&json!({
            "source_url": format!("https://reddit.com/{}", content),
            "source_type": "reddit",
            "content_type": "post",
            "raw_content": content,
            "metadata": {},
            "discovery_timestamp": "2025-10-17"
        }))
        .unwrap();
        FeatureRecord {
            estimated_value: value,
            ..extract_features(&d)
        }
    }

    #[test]
    fn test_value_distribution_bands() {
        let features = vec![
            feature("a", 0.7),
            feature("b", 0.69),
            feature("c", 0.4),
            feature("d", 0.39),
            feature("e", 0.0),
        ];
        assert_eq!(
            ValueDistribution::from_features(&features),
            ValueDistribution {
                high: 1,
                medium: 2,
                low: 2
            }
        );
    }

    #[test]
    fn test_category_breakdown_order() {
        let features = vec![
            feature("discord bot", 0.5),
            feature("telegram bot", 0.5),
            feature("scraper crawler", 0.5),
            feature("nothing", 0.5),
        ];
        assert_eq!(
            category_breakdown(&features),
            vec![
                (Category::Bot, 2),
                (Category::WebScraping, 1),
                (Category::General, 1)
            ]
        );
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("pretty".parse::<Format>().unwrap(), Format::Pretty);
        assert!("sarif".parse::<Format>().is_err());
    }

    #[test]
    fn test_extraction_report() {
        let mut batch = Batch::new(3);
        batch.items.push(feature("discord bot", 0.8));
        batch.items.push(feature("hello", 0.1));
        batch.skip(2, "malformed record");

        let report = ExtractionReport::new(&batch);
        assert_eq!(report.processed, 2);
        assert_eq!(report.total, 3);
        assert_eq!(report.categories.get("bot"), Some(&1));
        assert_eq!(report.value_distribution.high, 1);
        assert_eq!(report.skipped.len(), 1);
    }
}
