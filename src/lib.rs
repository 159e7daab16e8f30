//! loopcurate - curation pipeline for discovered automation loops.
//!
//! Raw discoveries (repository listings, forum posts) are turned into
//! normalized feature records, scored by a weighted heuristic, and filtered
//! down to the loops worth publishing. Every decision carries a readable
//! rationale.
//!
//! # Architecture
//!
//! - `record`: discovery, feature, score and approved-bundle records
//! - `parser`: tree-sitter structure counting behind a language registry
//! - `analyze`: code, text and popularity signal analyzers
//! - `extract`: feature extraction, one discovery in, one feature record out
//! - `score`: weighted quality scoring and decision thresholds
//! - `pipeline`: stage orchestration over discovery sources and a store
//! - `store`: collection persistence (JSON directory, in-memory)
//! - `config`: YAML configuration of weights and thresholds
//! - `report`: output formatting (text, JSON)
//!
//! # Adding a Language
//!
//! See `src/parser/languages/python.rs`. Write a structure query for the
//! grammar and register the parser in `languages/mod.rs`.

pub mod analyze;
pub mod batch;
pub mod cli;
pub mod config;
pub mod extract;
pub mod parser;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod score;
pub mod store;

pub use batch::{Batch, SkippedItem};
pub use config::{Config, ConfigError, ScoringConfig, Thresholds, Weights};
pub use extract::{extract_features, loop_id, FeatureExtractor};
pub use parser::{init as init_parsers, Parser, StructureCounts};
pub use pipeline::{
    DiscoverySource, JsonFileSource, Pipeline, PipelineStatus, RunOutcome, RunStats, Stage,
    StaticSource, StoredDiscoveries,
};
pub use record::{
    ApprovedLoop, Category, ComplexityTier, Decision, Discovery, FeatureRecord, Language,
    QualityScore, RecordError,
};
pub use score::{Scorer, ScoringOutcome, ScoringSummary};
pub use store::{Collection, JsonStore, MemoryStore, Store};

/// Initialize all subsystems eagerly.
///
/// Optional: each subsystem also initializes itself on first use.
pub fn init() {
    init_parsers();
}
