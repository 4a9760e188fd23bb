//! Command line argument parsing for the medirank CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::entity::EntityKind;

/// Medirank - doctor and hospital recommendations
#[derive(Parser, Debug, Clone)]
#[command(name = "medirank")]
#[command(about = "Recommend doctors by condition and doctors or hospitals by location")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct MedirankArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "MEDIRANK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl MedirankArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train the condition classifier and save the model
    Train(TrainArgs),

    /// Recommend doctors for a condition using a trained model
    Recommend(RecommendArgs),

    /// Rank doctors or hospitals near a position
    Nearby(NearbyArgs),

    /// Show how text is normalized
    Normalize(NormalizeArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Doctor records (JSON array or JSON lines)
    #[arg(short, long, value_name = "RECORDS_FILE")]
    pub records: PathBuf,

    /// Where to write the model (default: configured model path)
    #[arg(short, long, value_name = "MODEL_PATH")]
    pub output: Option<PathBuf>,

    /// Number of trees
    #[arg(long)]
    pub estimators: Option<usize>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Add common specialty conditions to each doctor before training
    #[arg(long)]
    pub expand_conditions: bool,
}

/// Arguments for condition recommendations
#[derive(Parser, Debug, Clone)]
pub struct RecommendArgs {
    /// Condition query
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Trained model (default: configured model path)
    #[arg(short, long, value_name = "MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Only doctors with exactly this specialization
    #[arg(short, long)]
    pub specialization: Option<String>,

    /// Maximum number of results to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Page number, starting at 1
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Doctor records to keyword-search when no condition matches
    #[arg(long, value_name = "RECORDS_FILE")]
    pub fallback_records: Option<PathBuf>,
}

/// Arguments for location ranking
#[derive(Parser, Debug, Clone)]
pub struct NearbyArgs {
    /// Doctor or hospital records (JSON array or JSON lines)
    #[arg(short, long, value_name = "RECORDS_FILE")]
    pub records: PathBuf,

    /// Kind of records
    #[arg(short, long, default_value = "doctor")]
    pub kind: KindArg,

    /// User latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// User longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Free-text query
    #[arg(long)]
    pub query: Option<String>,

    /// Specialization, merged into the query
    #[arg(short, long)]
    pub specialization: Option<String>,

    /// Search radius in kilometers (default: configured radius)
    #[arg(long, value_name = "KM")]
    pub max_distance: Option<f64>,

    /// Maximum number of results (default: configured limit)
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for text normalization
#[derive(Parser, Debug, Clone)]
pub struct NormalizeArgs {
    /// Text to normalize
    #[arg(value_name = "TEXT")]
    pub text: String,
}

/// Entity kinds accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindArg {
    Doctor,
    Hospital,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Doctor => EntityKind::Doctor,
            KindArg::Hospital => EntityKind::Hospital,
        }
    }
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
