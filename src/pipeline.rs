//! Pipeline orchestration: discovery, feature extraction, quality scoring,
//! filtering.
//!
//! Stages run strictly in sequence. Each stage's output is materialised in
//! full and written to the store before the next stage starts, so a failure
//! late in a run leaves every earlier collection intact.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::batch::Batch;
use crate::config::{Config, ConfigError};
use crate::extract::{decode_discoveries, FeatureExtractor};
use crate::record::{ApprovedLoop, Decision, Discovery, FeatureRecord, QualityScore};
use crate::score::{Scorer, ScoringSummary};
use crate::store::{read_records, read_records_file, write_collection, Collection, Store};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Discovery,
    FeatureExtraction,
    QualityScoring,
    Filtering,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Discovery => "discovery",
            Stage::FeatureExtraction => "feature_extraction",
            Stage::QualityScoring => "quality_scoring",
            Stage::Filtering => "filtering",
            Stage::Done => "done",
        }
    }

    pub fn next(&self) -> Stage {
        match self {
            Stage::Discovery => Stage::FeatureExtraction,
            Stage::FeatureExtraction => Stage::QualityScoring,
            Stage::QualityScoring => Stage::Filtering,
            Stage::Filtering | Stage::Done => Stage::Done,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Success,
    PartialFailure,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Success => "success",
            PipelineStatus::PartialFailure => "partial_failure",
        }
    }
}

/// A stage-level failure that did not abort the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
}

/// Items dropped by each stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub feature_extraction: usize,
    pub quality_scoring: usize,
    pub filtering: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.feature_extraction + self.quality_scoring + self.filtering
    }
}

/// Statistics for one run. Overwritten by every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub timestamp: String,
    pub duration_seconds: f64,
    pub discoveries: usize,
    pub features_extracted: usize,
    pub scores: usize,
    pub scoring_summary: ScoringSummary,
    pub approved_loops: usize,
    pub approval_rate: f64,
    pub pipeline_status: PipelineStatus,
    pub skipped: SkipCounts,
    pub stage_errors: Vec<StageError>,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub stats: RunStats,
    pub approved: Vec<ApprovedLoop>,
}

/// Supplier of raw discovery records.
///
/// Implementations must be safe to call from several threads; sources are
/// queried concurrently.
pub trait DiscoverySource: Send + Sync {
    /// Name used in logs and stage errors.
    fn name(&self) -> String;

    /// Return the raw records this source currently holds.
    fn discover(&self) -> anyhow::Result<Vec<Value>>;
}

/// A JSON file holding an array of discovery records.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DiscoverySource for JsonFileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn discover(&self) -> anyhow::Result<Vec<Value>> {
        read_records_file(&self.path)
    }
}

/// The discoveries collection already held by a store.
pub struct StoredDiscoveries<'a> {
    store: &'a dyn Store,
}

impl<'a> StoredDiscoveries<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }
}

impl DiscoverySource for StoredDiscoveries<'_> {
    fn name(&self) -> String {
        format!("stored {}", Collection::Discoveries)
    }

    fn discover(&self) -> anyhow::Result<Vec<Value>> {
        read_records(self.store, Collection::Discoveries)
    }
}

/// Records handed over in memory.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    records: Vec<Value>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, records: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

impl DiscoverySource for StaticSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn discover(&self) -> anyhow::Result<Vec<Value>> {
        Ok(self.records.clone())
    }
}

/// Raw records gathered from all sources.
#[derive(Debug, Clone, Default)]
pub struct Discovered {
    pub records: Vec<Value>,
    pub errors: Vec<StageError>,
}

/// Decoded discoveries and their feature records.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub discoveries: Vec<Discovery>,
    pub features: Batch<FeatureRecord>,
}

/// Sequences the curation stages over a store.
pub struct Pipeline<S: Store> {
    store: S,
    extractor: FeatureExtractor,
    scorer: Scorer,
}

impl<S: Store> Pipeline<S> {
    /// Build a pipeline. Fails on an invalid scoring configuration.
    pub fn new(config: &Config, store: S) -> Result<Self, ConfigError> {
        let parallel = config.is_parallel();
        Ok(Self {
            store,
            extractor: FeatureExtractor::new().parallel(parallel),
            scorer: Scorer::new(config.scoring)?.parallel(parallel),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run every stage and persist the run statistics.
    pub fn run(&self, sources: &[&dyn DiscoverySource]) -> anyhow::Result<RunOutcome> {
        let started = Instant::now();
        let timestamp = Utc::now().to_rfc3339();
        info!(sources = sources.len(), "pipeline run started");

        let mut stage = Stage::Discovery;
        info!(%stage, "stage started");
        let discovered = self.run_discovery(sources)?;
        let mut stage_errors = discovered.errors.clone();

        stage = stage.next();
        info!(%stage, "stage started");
        let extracted = self.run_feature_extraction(&discovered.records)?;

        stage = stage.next();
        info!(%stage, "stage started");
        let scores = self.run_quality_scoring(&extracted.features.items)?;

        stage = stage.next();
        info!(%stage, "stage started");
        let (approved, filter_skips) =
            self.filter_approved(&scores, &extracted.features.items, &extracted.discoveries)?;

        stage = stage.next();
        debug_assert_eq!(stage, Stage::Done);

        if discovered.records.is_empty() && stage_errors.is_empty() {
            warn!("no discoveries from any source");
        }

        let scoring_summary = ScoringSummary::from_scores(&scores);
        let skipped = SkipCounts {
            feature_extraction: extracted.features.skipped.len(),
            quality_scoring: extracted.features.items.len() - scores.len(),
            filtering: filter_skips,
        };
        if skipped.filtering > 0 {
            stage_errors.push(StageError {
                stage: Stage::Filtering,
                message: format!("{} approved scores could not be joined", filter_skips),
            });
        }

        let pipeline_status = if skipped.total() == 0 && stage_errors.is_empty() {
            PipelineStatus::Success
        } else {
            PipelineStatus::PartialFailure
        };

        let stats = RunStats {
            timestamp,
            duration_seconds: started.elapsed().as_secs_f64(),
            discoveries: discovered.records.len(),
            features_extracted: extracted.features.processed(),
            scores: scores.len(),
            approval_rate: scoring_summary.approval_rate,
            scoring_summary,
            approved_loops: approved.len(),
            pipeline_status,
            skipped,
            stage_errors,
        };
        write_collection(&self.store, Collection::Stats, &stats)?;

        info!(
            status = stats.pipeline_status.as_str(),
            discoveries = stats.discoveries,
            features = stats.features_extracted,
            approved = stats.approved_loops,
            duration_seconds = stats.duration_seconds,
            "pipeline run complete"
        );

        Ok(RunOutcome { stats, approved })
    }

    /// Gather records from every source concurrently and persist them.
    ///
    /// A failing source is logged and recorded; the others still contribute.
    /// Records keep source order, then in-source order.
    pub fn run_discovery(&self, sources: &[&dyn DiscoverySource]) -> anyhow::Result<Discovered> {
        let results: Vec<(String, anyhow::Result<Vec<Value>>)> = sources
            .par_iter()
            .map(|source| (source.name(), source.discover()))
            .collect();

        let mut discovered = Discovered::default();
        for (name, result) in results {
            match result {
                Ok(records) => {
                    info!(source = %name, count = records.len(), "source returned discoveries");
                    discovered.records.extend(records);
                }
                Err(e) => {
                    warn!(source = %name, error = %e, "discovery source failed");
                    discovered.errors.push(StageError {
                        stage: Stage::Discovery,
                        message: format!("{}: {:#}", name, e),
                    });
                }
            }
        }

        write_collection(&self.store, Collection::Discoveries, &discovered.records)?;
        info!(count = discovered.records.len(), "discovery complete");
        Ok(discovered)
    }

    /// Decode discoveries, extract features and persist them.
    pub fn run_feature_extraction(&self, raw: &[Value]) -> anyhow::Result<Extracted> {
        let decoded = decode_discoveries(raw);
        let features = Batch {
            items: self.extractor.extract_all(&decoded.items),
            skipped: decoded.skipped,
            total: decoded.total,
        };

        write_collection(&self.store, Collection::Features, &features.items)?;
        info!("feature extraction complete: {}", features.summary());

        Ok(Extracted {
            discoveries: decoded.items,
            features,
        })
    }

    /// Score feature records and persist the scores.
    pub fn run_quality_scoring(
        &self,
        features: &[FeatureRecord],
    ) -> anyhow::Result<Vec<QualityScore>> {
        let scores = self.scorer.score_features(features);
        write_collection(&self.store, Collection::Scores, &scores)?;

        let summary = ScoringSummary::from_scores(&scores);
        info!(
            approved = summary.approved,
            rejected = summary.rejected,
            needs_review = summary.needs_review,
            "quality scoring complete: {} of {} processed successfully",
            scores.len(),
            features.len()
        );
        Ok(scores)
    }

    /// Join approved scores back to their features and discoveries, in score
    /// order, and persist the bundles. Returns the bundles and the number of
    /// approved scores that could not be joined.
    pub fn filter_approved(
        &self,
        scores: &[QualityScore],
        features: &[FeatureRecord],
        discoveries: &[Discovery],
    ) -> anyhow::Result<(Vec<ApprovedLoop>, usize)> {
        let (approved, unmatched) = join_approved(scores, features, discoveries);
        write_collection(&self.store, Collection::Approved, &approved)?;
        info!(count = approved.len(), "filtering complete");
        Ok((approved, unmatched))
    }
}

/// Approved scores joined by `loop_id` to features and by `source_url` to
/// discoveries.
pub fn join_approved(
    scores: &[QualityScore],
    features: &[FeatureRecord],
    discoveries: &[Discovery],
) -> (Vec<ApprovedLoop>, usize) {
    let features_by_id: HashMap<&str, &FeatureRecord> =
        features.iter().map(|f| (f.loop_id.as_str(), f)).collect();
    let discoveries_by_url: HashMap<&str, &Discovery> = discoveries
        .iter()
        .map(|d| (d.source_url.as_str(), d))
        .collect();

    let mut approved = Vec::new();
    let mut unmatched = 0;

    for score in scores
        .iter()
        .filter(|s| s.approval_decision == Decision::Approved)
    {
        let joined = features_by_id.get(score.loop_id.as_str()).and_then(|f| {
            discoveries_by_url
                .get(f.source_url.as_str())
                .map(|d| (*f, *d))
        });

        match joined {
            Some((features, discovery)) => approved.push(ApprovedLoop {
                loop_id: score.loop_id.clone(),
                score: score.clone(),
                features: features.clone(),
                discovery: discovery.clone(),
            }),
            None => {
                warn!(loop_id = %score.loop_id, "approved score has no matching records");
                unmatched += 1;
            }
        }
    }

    (approved, unmatched)
}
