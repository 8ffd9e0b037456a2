use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{ClockModel, ReconcileArgs};
use crate::commands::analyze::{
    EssFailure, GateConfig, Pipeline, ReplicateResult, SampleDiscontinuity, YEARS_COLUMN,
    compute_hours,
};
use crate::runtime::{RuntimeEstimator, ScreenlogRuntimeEstimator};
use crate::stats::{GeyerEss, SeriesSummary, summarize};

#[derive(Debug, Serialize)]
struct ReconcileReport {
    log_path: String,
    reconciled_path: String,
    clock: ClockModel,
    bursts: bool,
    converged: bool,
    n_samples: i64,
    discontinuities: Vec<SampleDiscontinuity>,
    failures: Vec<EssFailure>,
    per_split_ess: Option<f64>,
    years_per_split: Option<SeriesSummary>,
    compute_hours: Option<f64>,
}

pub fn run(args: ReconcileArgs) -> Result<()> {
    let gate = GateConfig::new(args.burnin, args.ess_threshold)?;
    let base_dir = args
        .base_dir
        .clone()
        .unwrap_or_else(|| default_base_dir(&args.log_path));

    let statistic = GeyerEss;
    let estimator = ScreenlogRuntimeEstimator::new()?;
    let pipeline = Pipeline {
        gate,
        base_dir: &base_dir,
        statistic: &statistic,
        runtime: &estimator,
        print_expected: args.print_expected,
    };

    let processed = pipeline
        .process_trace_log(&args.log_path, args.clock, args.bursts)
        .with_context(|| format!("failed to reconcile {}", args.log_path.display()))?;

    let hours_per_msample = match args.log_path.parent() {
        Some(run_dir) => match estimator.hours_per_msample(run_dir) {
            Ok(hours) => Some(hours),
            Err(err) => {
                warn!(error = %err, "runtime estimate unavailable");
                None
            }
        },
        None => None,
    };

    let n_samples = processed.result.n_samples();
    let (converged, failures, per_split_ess, years_per_split) = match processed.result {
        ReplicateResult::Converged(converged) => {
            let years = converged
                .series
                .get(YEARS_COLUMN)
                .and_then(|values| summarize(values));
            (true, Vec::new(), converged.per_split_ess, years)
        }
        ReplicateResult::Unconverged(unconverged) => (false, unconverged.failures, None, None),
    };

    let report = ReconcileReport {
        log_path: args.log_path.display().to_string(),
        reconciled_path: processed.reconciled_path.display().to_string(),
        clock: args.clock,
        bursts: args.bursts,
        converged,
        n_samples,
        discontinuities: processed.discontinuities,
        failures,
        per_split_ess,
        years_per_split,
        compute_hours: hours_per_msample.map(|hours| compute_hours(hours, n_samples)),
    };

    info!(
        log = %report.log_path,
        converged = report.converged,
        n_samples = report.n_samples,
        discontinuities = report.discontinuities.len(),
        "trace log reconciled"
    );

    if args.json {
        write_json_report(&report)?;
    } else {
        write_text_report(&report)?;
    }

    Ok(())
}

// Diagnostics name the run directory relative to the directory holding it.
fn default_base_dir(log_path: &Path) -> PathBuf {
    log_path
        .parent()
        .and_then(Path::parent)
        .map(ToOwned::to_owned)
        .unwrap_or_default()
}

fn write_json_report(report: &ReconcileReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, report)
        .context("failed to serialize reconcile json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_report(report: &ReconcileReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Log: {}", report.log_path)?;
    writeln!(output, "Reconciled: {}", report.reconciled_path)?;
    writeln!(
        output,
        "Model: clock={} bursts={}",
        report.clock.as_str(),
        report.bursts
    )?;
    writeln!(
        output,
        "Samples: {} discontinuities={}",
        report.n_samples,
        report.discontinuities.len()
    )?;
    for discontinuity in &report.discontinuities {
        writeln!(
            output,
            "  row {}: expected {} but found {}",
            discontinuity.row, discontinuity.expected, discontinuity.found
        )?;
    }

    if report.converged {
        writeln!(output, "Converged: yes")?;
    } else {
        writeln!(output, "Converged: no")?;
        for failure in &report.failures {
            writeln!(output, "  {} ess={:.1}", failure.column, failure.ess)?;
        }
    }
    if let Some(ess) = report.per_split_ess {
        writeln!(output, "perSplit ESS: {ess:.1}")?;
    }
    if let Some(years) = &report.years_per_split {
        writeln!(
            output,
            "Years per split: q05={:.3} q50={:.3} q95={:.3} mean={:.3} std={:.3}",
            years.q05, years.q50, years.q95, years.mean, years.std
        )?;
    }
    match report.compute_hours {
        Some(hours) => writeln!(output, "Compute hours: {hours:.3}")?,
        None => writeln!(output, "Compute hours: unavailable")?,
    }

    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::relative_display;

    #[test]
    fn default_base_dir_keeps_run_directory_in_diagnostics() {
        let log_path = Path::new("/data/runs/bantu/bantu-burstclock-2/vocabulary.log");
        let base_dir = default_base_dir(log_path);
        assert_eq!(base_dir, PathBuf::from("/data/runs/bantu"));

        let run_dir = log_path.parent().expect("run dir");
        assert_eq!(relative_display(run_dir, &base_dir), "bantu-burstclock-2");
    }

    #[test]
    fn default_base_dir_of_bare_file_name_is_empty() {
        assert_eq!(default_base_dir(Path::new("vocabulary.log")), PathBuf::new());
    }
}
