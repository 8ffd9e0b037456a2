use super::*;

pub(crate) const DEFAULT_BURNIN: f64 = 0.1;
pub(crate) const DEFAULT_ESS_THRESHOLD: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GateConfig {
    pub burnin: f64,
    pub ess_threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            burnin: DEFAULT_BURNIN,
            ess_threshold: DEFAULT_ESS_THRESHOLD,
        }
    }
}

impl GateConfig {
    pub fn new(burnin: f64, ess_threshold: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&burnin) {
            bail!("burn-in fraction must lie in [0, 1), got {burnin}");
        }
        if !ess_threshold.is_finite() || ess_threshold < 0.0 {
            bail!("ESS threshold must be a finite non-negative number, got {ess_threshold}");
        }
        Ok(Self {
            burnin,
            ess_threshold,
        })
    }
}

/// Number of leading samples dropped as burn-in; halves round to even.
pub(crate) fn burnin_count(len: usize, burnin: f64) -> usize {
    ((len as f64 * burnin).round_ties_even() as usize).min(len)
}

pub(crate) fn discard_burnin(series: &[f64], burnin: f64) -> &[f64] {
    &series[burnin_count(series.len(), burnin)..]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct EssFailure {
    pub column: String,
    pub ess: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ConvergedReplicate {
    pub series: ColumnSeries,
    pub n_samples: i64,
    pub per_split_ess: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UnconvergedReplicate {
    pub n_samples_at_failure: i64,
    pub failures: Vec<EssFailure>,
}

/// Gate verdict for one replicate. Only converged replicates carry series.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ReplicateResult {
    Converged(ConvergedReplicate),
    Unconverged(UnconvergedReplicate),
}

impl ReplicateResult {
    pub fn n_samples(&self) -> i64 {
        match self {
            Self::Converged(converged) => converged.n_samples,
            Self::Unconverged(unconverged) => unconverged.n_samples_at_failure,
        }
    }

    pub fn verdict(&self) -> ReplicateVerdict {
        match self {
            Self::Converged(_) => ReplicateVerdict::Converged,
            Self::Unconverged(_) => ReplicateVerdict::Unconverged,
        }
    }
}

/// Trims burn-in from every numeric column and requires an ESS of at least
/// the threshold for every column but `Sample`.
pub(crate) fn evaluate_replicate(
    table: &TraceTable,
    config: GateConfig,
    statistic: &dyn ConvergenceStatistic,
) -> Result<ReplicateResult, TraceError> {
    let n_samples = table.last_sample()?;

    let mut series = ColumnSeries::new();
    let mut failures = Vec::new();
    let mut per_split_ess = None;
    for (column, values) in table.numeric_series() {
        let kept = discard_burnin(&values, config.burnin).to_vec();
        if column != SAMPLE_COLUMN {
            let ess = statistic.effective_sample_size(&kept);
            if ess < config.ess_threshold {
                failures.push(EssFailure {
                    column: column.clone(),
                    ess,
                });
            }
            if column == PER_SPLIT_COLUMN {
                per_split_ess = Some(ess);
            }
        }
        series.insert(column, kept);
    }

    if !failures.is_empty() {
        return Ok(ReplicateResult::Unconverged(UnconvergedReplicate {
            n_samples_at_failure: n_samples,
            failures,
        }));
    }

    Ok(ReplicateResult::Converged(ConvergedReplicate {
        series,
        n_samples,
        per_split_ess,
    }))
}
