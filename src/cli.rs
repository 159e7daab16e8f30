//! Command-line interface for loopcurate.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{Config, DEFAULT_CONFIG_NAMES};
use crate::extract::FeatureExtractor;
use crate::pipeline::{DiscoverySource, JsonFileSource, Pipeline, PipelineStatus, StoredDiscoveries};
use crate::report::{self, Format};
use crate::score::Scorer;
use crate::store::{read_records_file, write_json_file, JsonStore};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default output paths of the single-stage commands.
const DEFAULT_FEATURES_OUTPUT: &str = "extracted_features.json";
const DEFAULT_SCORES_OUTPUT: &str = "quality_scores.json";

/// Curation pipeline for discovered automation loops.
///
/// Turns raw discoveries from repository listings and forum posts into
/// feature records, scores them, and keeps the ones worth publishing.
#[derive(Parser)]
#[command(name = "loopcurate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: discovery, extraction, scoring, filtering
    Run(RunArgs),
    /// Extract feature records from a discoveries file
    Extract(ExtractArgs),
    /// Score a feature records file
    Score(ScoreArgs),
    /// Write the default configuration file
    Init(InitArgs),
}

/// Arguments for the run command.
#[derive(Parser)]
pub struct RunArgs {
    /// Directory holding the persisted collections (default: from config, else "data")
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Discoveries file to ingest; repeat for several sources. Without any,
    /// the discoveries already in the data directory are used.
    #[arg(short, long = "input")]
    pub inputs: Vec<PathBuf>,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Exit non-zero when the run is a partial failure
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the extract command.
#[derive(Parser)]
pub struct ExtractArgs {
    /// Discoveries JSON file
    pub input: PathBuf,

    /// Output file for the feature records
    #[arg(short, long, default_value = DEFAULT_FEATURES_OUTPUT)]
    pub output: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Arguments for the score command.
#[derive(Parser)]
pub struct ScoreArgs {
    /// Feature records JSON file
    pub input: PathBuf,

    /// Output file for the quality scores
    #[arg(short, long, default_value = DEFAULT_SCORES_OUTPUT)]
    pub output: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "loopcurate.yaml")]
    pub output: PathBuf,
}

/// Default configuration written by `init`.
const DEFAULT_TEMPLATE: &str = include_str!("templates/default.yaml");

/// Load the explicit config, else a discovered one, else the defaults.
/// The result is validated.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => Config::discover(Path::new(".")),
    };

    let config = match &path {
        Some(p) => Config::parse_file(p)
            .map_err(|e| anyhow::anyhow!("parsing config {}: {}", p.display(), e))?,
        None => {
            tracing::debug!(
                "no config file found (looked for {}), using defaults",
                DEFAULT_CONFIG_NAMES.join(", ")
            );
            Config::default()
        }
    };

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid config: {}", e))?;
    Ok(config)
}

/// Run the run command.
pub fn run_pipeline(args: &RunArgs) -> anyhow::Result<i32> {
    let format: Format = args.format.parse()?;
    let config = load_config(args.config.as_deref())?;

    let data_dir = args.data_dir.clone().unwrap_or_else(|| config.data_dir());
    let pipeline = Pipeline::new(&config, JsonStore::new(&data_dir))?;

    let file_sources: Vec<JsonFileSource> = args.inputs.iter().map(JsonFileSource::new).collect();
    let stored = StoredDiscoveries::new(pipeline.store());
    let sources: Vec<&dyn DiscoverySource> = if file_sources.is_empty() {
        vec![&stored as &dyn DiscoverySource]
    } else {
        file_sources
            .iter()
            .map(|s| s as &dyn DiscoverySource)
            .collect()
    };

    let outcome = pipeline.run(&sources)?;

    match format {
        Format::Json => report::write_run_json(&outcome)?,
        Format::Pretty => report::write_run_pretty(&outcome, &data_dir.to_string_lossy()),
    }

    if args.strict && outcome.stats.pipeline_status == PipelineStatus::PartialFailure {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the extract command.
pub fn run_extract(args: &ExtractArgs) -> anyhow::Result<i32> {
    let format: Format = args.format.parse()?;
    let raw = read_records_file(&args.input)?;

    let batch = FeatureExtractor::new().process_discoveries(&raw);
    write_json_file(&args.output, &batch.items)?;

    match format {
        Format::Json => report::write_extraction_json(&batch)?,
        Format::Pretty => {
            report::write_extraction_pretty(&batch);
            println!("  Saved to {}", args.output.display());
            println!();
        }
    }

    Ok(EXIT_SUCCESS)
}

/// Run the score command.
pub fn run_score(args: &ScoreArgs) -> anyhow::Result<i32> {
    let format: Format = args.format.parse()?;
    let config = load_config(args.config.as_deref())?;
    let raw = read_records_file(&args.input)?;

    let scorer = Scorer::new(config.scoring)?.parallel(config.is_parallel());
    let outcome = scorer.score_all(&raw);
    write_json_file(&args.output, &outcome.batch.items)?;

    match format {
        Format::Json => report::write_scoring_json(&outcome)?,
        Format::Pretty => {
            report::write_scoring_pretty(&outcome);
            println!("  Saved to {}", args.output.display());
            println!();
        }
    }

    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, DEFAULT_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to tune weights and thresholds", args.output.display());
    println!(
        "  2. Run: loopcurate run --input discoveries.json --config {}",
        args.output.display()
    );

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "loopcurate",
            "run",
            "--input",
            "a.json",
            "--input",
            "b.json",
            "--format",
            "json",
            "--strict",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.inputs.len(), 2);
                assert_eq!(args.format, "json");
                assert!(args.strict);
                assert!(args.data_dir.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_init_writes_valid_config() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("conf/loopcurate.yaml");
        let args = InitArgs {
            output: output.clone(),
        };

        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        let config = load_config(Some(&output)).unwrap();
        assert_eq!(config.scoring, ScoringConfig::default());

        // refuses to overwrite
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_strict_run_exit_codes() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("loopcurate.yaml");
        std::fs::write(&config, DEFAULT_TEMPLATE).unwrap();
        let testdata = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata");

        let args = |input: &str, strict: bool| RunArgs {
            data_dir: Some(dir.path().join("data")),
            inputs: vec![testdata.join(input)],
            config: Some(config.clone()),
            format: "json".to_string(),
            strict,
        };

        // one malformed record makes the run a partial failure
        assert_eq!(
            run_pipeline(&args("discoveries_malformed.json", true)).unwrap(),
            EXIT_FAILED
        );
        assert_eq!(
            run_pipeline(&args("discoveries_malformed.json", false)).unwrap(),
            EXIT_SUCCESS
        );
        assert_eq!(
            run_pipeline(&args("discoveries.json", true)).unwrap(),
            EXIT_SUCCESS
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(
            &path,
            "scoring:\n  thresholds:\n    approval: 0.2\n    rejection: 0.5\n",
        )
        .unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }
}
