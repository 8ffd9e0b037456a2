use super::*;

pub(crate) fn compute_hours(hours_per_msample: f64, n_samples: i64) -> f64 {
    hours_per_msample * n_samples as f64 / 1_000_000.0
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ConditionAggregate {
    pub key: ConditionKey,
    pub series: ColumnSeries,
    pub per_split_ess: Vec<f64>,
    pub converged_replicates: usize,
    pub unconverged_replicates: usize,
    pub complete_compute_hours: Vec<f64>,
    pub incomplete_compute_hours: Vec<f64>,
}

impl ConditionAggregate {
    pub fn new(key: ConditionKey) -> Self {
        Self {
            key,
            series: ColumnSeries::new(),
            per_split_ess: Vec::new(),
            converged_replicates: 0,
            unconverged_replicates: 0,
            complete_compute_hours: Vec::new(),
            incomplete_compute_hours: Vec::new(),
        }
    }

    pub fn merge(&mut self, result: &ReplicateResult, hours_per_msample: Option<f64>) {
        match result {
            ReplicateResult::Converged(converged) => {
                self.converged_replicates += 1;
                for (column, values) in &converged.series {
                    self.series
                        .entry(column.clone())
                        .or_default()
                        .extend_from_slice(values);
                }
                self.per_split_ess.extend(converged.per_split_ess);
                if let Some(hours) = hours_per_msample {
                    self.complete_compute_hours
                        .push(compute_hours(hours, converged.n_samples));
                }
            }
            ReplicateResult::Unconverged(unconverged) => {
                self.unconverged_replicates += 1;
                if let Some(hours) = hours_per_msample {
                    self.incomplete_compute_hours
                        .push(compute_hours(hours, unconverged.n_samples_at_failure));
                }
            }
        }
    }

    pub fn series(&self, column: &str) -> &[f64] {
        self.series.get(column).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ProcessedTrace {
    pub result: ReplicateResult,
    pub discontinuities: Vec<SampleDiscontinuity>,
    pub reconciled_path: PathBuf,
}

pub(crate) struct Pipeline<'a> {
    pub gate: GateConfig,
    pub base_dir: &'a Path,
    pub statistic: &'a dyn ConvergenceStatistic,
    pub runtime: &'a dyn RuntimeEstimator,
    pub print_expected: bool,
}

impl Pipeline<'_> {
    pub fn process_trace_log(
        &self,
        log_path: &Path,
        clock: ClockModel,
        bursts: bool,
    ) -> Result<ProcessedTrace> {
        let run_dir = log_path.parent().unwrap_or(log_path);
        let run = relative_display(run_dir, self.base_dir);

        let mut table = read_trace_table(log_path)?;
        let discontinuities = reconcile_samples(&mut table)?;
        for discontinuity in &discontinuities {
            if self.print_expected {
                info!(
                    run = %run,
                    row = discontinuity.row,
                    expected = discontinuity.expected,
                    found = discontinuity.found,
                    "sample counter discontinuity"
                );
            } else {
                debug!(
                    run = %run,
                    row = discontinuity.row,
                    expected = discontinuity.expected,
                    found = discontinuity.found,
                    "sample counter discontinuity"
                );
            }
        }

        DerivedMetricComputer::new(clock, bursts).apply(&mut table)?;

        let reconciled_path = reconciled_log_path(log_path);
        write_trace_table(&reconciled_path, &table)?;

        let result = evaluate_replicate(&table, self.gate, self.statistic)?;
        if let ReplicateResult::Unconverged(unconverged) = &result {
            for failure in &unconverged.failures {
                warn!(
                    run = %run,
                    column = %failure.column,
                    ess = failure.ess,
                    threshold = self.gate.ess_threshold,
                    "effective sample size below threshold"
                );
            }
        }

        Ok(ProcessedTrace {
            result,
            discontinuities,
            reconciled_path,
        })
    }

    /// Processes replicates `1..=replicates` of one condition, skipping
    /// missing run directories and replicates whose trace cannot be used.
    pub fn aggregate_condition(
        &self,
        family_dir: &Path,
        key: &ConditionKey,
        replicates: u32,
    ) -> (ConditionAggregate, Vec<ReplicateRecord>) {
        let mut aggregate = ConditionAggregate::new(key.clone());
        let mut records = Vec::new();

        for index in 1..=replicates {
            let run_dir = family_dir.join(key.replicate_dir_name(index));
            if !run_dir.is_dir() {
                debug!(run = %run_dir.display(), "replicate directory missing");
                continue;
            }
            let run = relative_display(&run_dir, self.base_dir);

            let hours_per_msample = match self.runtime.hours_per_msample(&run_dir) {
                Ok(hours) => Some(hours),
                Err(err) => {
                    warn!(run = %run, error = %err, "runtime estimate unavailable");
                    None
                }
            };

            let log_path = run_dir.join(TRACE_FILE_NAME);
            let mut record = ReplicateRecord {
                family: key.family.clone(),
                condition: key.label(),
                index,
                run_dir: run.clone(),
                trace_sha256: sha256_file(&log_path).ok(),
                verdict: ReplicateVerdict::Failed,
                n_samples: None,
                hours_per_msample,
                discontinuities: 0,
                failed_columns: Vec::new(),
                failure_reason: None,
            };

            match self.process_trace_log(&log_path, key.clock, key.bursts) {
                Ok(processed) => {
                    record.verdict = processed.result.verdict();
                    record.n_samples = Some(processed.result.n_samples());
                    record.discontinuities = processed.discontinuities.len();
                    if let ReplicateResult::Unconverged(unconverged) = &processed.result {
                        record.failed_columns = unconverged
                            .failures
                            .iter()
                            .map(|failure| failure.column.clone())
                            .collect();
                    }
                    aggregate.merge(&processed.result, hours_per_msample);
                }
                Err(err) => {
                    error!(
                        family = %key.family,
                        condition = %key.label(),
                        run = %run,
                        error = %format!("{err:#}"),
                        "failed to process replicate"
                    );
                    record.failure_reason = Some(format!("{err:#}"));
                }
            }

            records.push(record);
        }

        (aggregate, records)
    }
}
