use super::*;

pub(crate) fn build_condition_summary(aggregate: &ConditionAggregate) -> ConditionSummary {
    let key = &aggregate.key;

    let (years_per_split, years_per_split_summary, changes_per_split, fraction) =
        if key.bursts {
            let years = aggregate.series(YEARS_COLUMN).to_vec();
            let years_summary = summarize(&years);
            let per_split = aggregate.series(PER_SPLIT_COLUMN);
            (
                Some(years),
                years_summary,
                changes_per_split_quantiles(per_split),
                bursts_fraction(per_split),
            )
        } else {
            (None, None, None, None)
        };

    let burst_parameter_ess = if fraction == Some(1.0) {
        aggregate.per_split_ess.iter().copied().reduce(f64::min)
    } else {
        None
    };

    ConditionSummary {
        family: key.family.clone(),
        clock: key.clock,
        bursts: key.bursts,
        converged_replicates: aggregate.converged_replicates,
        unconverged_replicates: aggregate.unconverged_replicates,
        tree_height: aggregate.series(TREE_HEIGHT_COLUMN).to_vec(),
        clock_rate: aggregate.series(CLOCKRATE_EST_COLUMN).to_vec(),
        year_loss: aggregate.series(YEARLOSS_COLUMN).to_vec(),
        relaxed_clock_sigma: key
            .clock
            .is_relaxed()
            .then(|| aggregate.series(RELAXED_SIGMA_COLUMN).to_vec()),
        years_per_split,
        years_per_split_summary,
        changes_per_split,
        bursts_fraction: fraction,
        burst_parameter_ess,
        complete_compute_hours: aggregate.complete_compute_hours.clone(),
        incomplete_compute_hours: aggregate.incomplete_compute_hours.clone(),
    }
}

/// 5th, 50th and 95th percentile of the strictly positive burst sizes.
pub(crate) fn changes_per_split_quantiles(per_split: &[f64]) -> Option<[f64; 3]> {
    let positive = per_split
        .iter()
        .copied()
        .filter(|value| *value > 0.0)
        .collect::<Vec<f64>>();
    let q = quantiles(&positive, &[0.05, 0.5, 0.95])?;
    Some([q[0], q[1], q[2]])
}

pub(crate) fn bursts_fraction(per_split: &[f64]) -> Option<f64> {
    let indicator = per_split
        .iter()
        .map(|value| if *value > 0.0 { 1.0 } else { 0.0 })
        .collect::<Vec<f64>>();
    mean(&indicator)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct CrossFamilyExtrema {
    pub min_changes_q05: Option<LabeledValue>,
    pub max_changes_q95: Option<LabeledValue>,
    pub min_burst_ess: Option<LabeledValue>,
    pub max_burst_ess: Option<LabeledValue>,
    pub burst_odds: Vec<f64>,
}

impl CrossFamilyExtrema {
    /// Folds in one burst condition. Returns `false` when the condition has no
    /// converged `perSplit` draws to contribute.
    pub fn observe(&mut self, key: &ConditionKey, summary: &ConditionSummary) -> bool {
        let Some(fraction) = summary.bursts_fraction else {
            return false;
        };
        let owner = key.owner_label();

        if let Some(changes) = summary.changes_per_split {
            replace_if(&mut self.min_changes_q05, changes[0], &owner, |new, old| {
                new < old
            });
            replace_if(&mut self.max_changes_q95, changes[2], &owner, |new, old| {
                new > old
            });
        }

        if fraction == 1.0 {
            if let Some(ess) = summary.burst_parameter_ess {
                replace_if(&mut self.max_burst_ess, ess, &owner, |new, old| new > old);
                replace_if(&mut self.min_burst_ess, ess, &owner, |new, old| new < old);
            }
        } else {
            self.burst_odds.push(fraction / (1.0 - fraction));
        }

        true
    }

    pub fn worst_burst_odds(&self) -> Option<f64> {
        self.burst_odds.iter().copied().reduce(f64::min)
    }
}

fn replace_if(
    slot: &mut Option<LabeledValue>,
    value: f64,
    owner: &str,
    better: impl Fn(f64, f64) -> bool,
) {
    let replace = match slot {
        Some(current) => better(value, current.value),
        None => true,
    };
    if replace {
        *slot = Some(LabeledValue {
            value,
            owner: owner.to_string(),
        });
    }
}
