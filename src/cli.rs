use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

pub const DEFAULT_FAMILIES: [&str; 4] = ["Austronesian", "Bantu", "Indo-European", "Sino-Tibetan"];

#[derive(Parser, Debug)]
#[command(
    name = "burstclock",
    version,
    about = "Convergence gating and summary statistics for burst-clock MCMC replicates"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Analyze(AnalyzeArgs),
    Reconcile(ReconcileArgs),
    Runtime(RuntimeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(long, default_value = "runs")]
    pub runs_root: PathBuf,

    /// Base directory for the run paths printed in convergence diagnostics.
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    #[arg(long = "family")]
    pub families: Vec<String>,

    #[arg(long, default_value_t = 0.1)]
    pub burnin: f64,

    #[arg(long, default_value_t = 200.0)]
    pub ess_threshold: f64,

    #[arg(long, default_value_t = 9)]
    pub replicates: u32,

    #[arg(long, default_value = "analysis")]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    pub print_expected: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ReconcileArgs {
    #[arg(long)]
    pub log_path: PathBuf,

    #[arg(long, value_enum, default_value_t = ClockModel::Strict)]
    pub clock: ClockModel,

    #[arg(long, default_value_t = false)]
    pub bursts: bool,

    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 0.1)]
    pub burnin: f64,

    #[arg(long, default_value_t = 200.0)]
    pub ess_threshold: f64,

    #[arg(long, default_value_t = false)]
    pub print_expected: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RuntimeArgs {
    #[arg(long)]
    pub run_dir: PathBuf,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClockModel {
    Strict,
    Relaxed,
}

impl ClockModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Relaxed => "relaxed",
        }
    }

    pub fn is_relaxed(self) -> bool {
        self == Self::Relaxed
    }
}
