use std::collections::BTreeMap;

use serde::Serialize;

use crate::cli::ClockModel;
use crate::stats::SeriesSummary;
use crate::util::family_to_path;

/// One experimental condition: language family, clock model and burst flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConditionKey {
    pub family: String,
    pub clock: ClockModel,
    pub bursts: bool,
}

impl ConditionKey {
    pub fn new(family: impl Into<String>, clock: ClockModel, bursts: bool) -> Self {
        Self {
            family: family.into(),
            clock,
            bursts,
        }
    }

    /// The four conditions of a family, in reporting order.
    pub fn all_for(family: &str) -> Vec<Self> {
        let mut keys = Vec::with_capacity(4);
        for clock in [ClockModel::Strict, ClockModel::Relaxed] {
            for bursts in [false, true] {
                keys.push(Self::new(family, clock, bursts));
            }
        }
        keys
    }

    pub fn label(&self) -> String {
        let bursts = if self.bursts {
            " with bursts"
        } else {
            ", no bursts"
        };
        format!("{}{}", self.clock.as_str(), bursts)
    }

    /// Family plus clock model, the name used for cross-family extrema.
    pub fn owner_label(&self) -> String {
        format!("{} ({})", self.family, self.clock.as_str())
    }

    pub fn replicate_dir_name(&self, index: u32) -> String {
        let relaxed = if self.clock.is_relaxed() {
            "-relaxed"
        } else {
            ""
        };
        let bursts = if self.bursts { "-burstclock" } else { "" };
        format!(
            "{}{relaxed}{bursts}-{index}",
            family_to_path(&self.family)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConditionSummary {
    pub family: String,
    pub clock: ClockModel,
    pub bursts: bool,
    pub converged_replicates: usize,
    pub unconverged_replicates: usize,
    pub tree_height: Vec<f64>,
    pub clock_rate: Vec<f64>,
    pub year_loss: Vec<f64>,
    pub relaxed_clock_sigma: Option<Vec<f64>>,
    pub years_per_split: Option<Vec<f64>>,
    pub years_per_split_summary: Option<SeriesSummary>,
    pub changes_per_split: Option<[f64; 3]>,
    pub bursts_fraction: Option<f64>,
    pub burst_parameter_ess: Option<f64>,
    pub complete_compute_hours: Vec<f64>,
    pub incomplete_compute_hours: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FamilySummary {
    pub family: String,
    pub generated_at: String,
    pub conditions: BTreeMap<String, ConditionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledValue {
    pub value: f64,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeEntry {
    pub family: String,
    pub condition: String,
    pub complete_compute_hours: Vec<f64>,
    pub incomplete_compute_hours: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeTable {
    pub generated_at: String,
    pub entries: Vec<RuntimeEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisConfig {
    pub runs_root: String,
    pub base_dir: String,
    pub families: Vec<String>,
    pub burnin: f64,
    pub ess_threshold: f64,
    pub replicates: u32,
    pub output_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicateVerdict {
    Converged,
    Unconverged,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplicateRecord {
    pub family: String,
    pub condition: String,
    pub index: u32,
    pub run_dir: String,
    pub trace_sha256: Option<String>,
    pub verdict: ReplicateVerdict,
    pub n_samples: Option<i64>,
    pub hours_per_msample: Option<f64>,
    pub discontinuities: usize,
    pub failed_columns: Vec<String>,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub command: String,
    pub config: AnalysisConfig,
    pub replicates: Vec<ReplicateRecord>,
    pub warnings: Vec<String>,
}
