use super::*;

pub(crate) const CLOCKRATE_COLUMN: &str = "clockrate";
pub(crate) const RATES_MEAN_COLUMN: &str = "RatesStat.mean";
pub(crate) const RATES_VARIANCE_COLUMN: &str = "RatesStat.variance";
pub(crate) const PER_SPLIT_COLUMN: &str = "perSplit";
pub(crate) const LOSSRATE_COLUMN: &str = "lossrate";
pub(crate) const TREE_HEIGHT_COLUMN: &str = "TreeHeight";
pub(crate) const RELAXED_SIGMA_COLUMN: &str = "RelaxedClockSigma";

pub(crate) const YEARS_COLUMN: &str = "Years";
pub(crate) const CLOCK_STD_COLUMN: &str = "clock_std";
pub(crate) const CLOCKRATE_EST_COLUMN: &str = "clockrate_est";
pub(crate) const YEARLOSS_COLUMN: &str = "yearloss";

const YEARLOSS_HORIZON: i32 = 1000;

/// Percentage of trait signal lost after 1000 years at a per-year `lossrate`.
pub(crate) fn year_loss(lossrate: f64) -> f64 {
    (1.0 - (1.0 - lossrate).powi(YEARLOSS_HORIZON)) * 100.0
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct DerivedMetricComputer {
    clock: ClockModel,
    bursts: bool,
}

impl DerivedMetricComputer {
    pub fn new(clock: ClockModel, bursts: bool) -> Self {
        Self { clock, bursts }
    }

    pub fn derived_columns(&self) -> Vec<&'static str> {
        let mut columns = Vec::with_capacity(4);
        if self.bursts {
            columns.push(YEARS_COLUMN);
        }
        if self.clock.is_relaxed() {
            columns.push(CLOCK_STD_COLUMN);
        }
        columns.push(CLOCKRATE_EST_COLUMN);
        columns.push(YEARLOSS_COLUMN);
        columns
    }

    pub fn apply(&self, table: &mut TraceTable) -> Result<(), TraceError> {
        if self.bursts {
            clamp_per_split(table);
        }

        let columns = self.derived_columns();
        let mut derived = vec![Vec::with_capacity(table.rows.len()); columns.len()];
        for row in 0..table.rows.len() {
            for (slot, column) in columns.iter().enumerate() {
                derived[slot].push(self.derive_cell(table, row, column)?);
            }
        }

        for (column, values) in columns.into_iter().zip(derived) {
            table.push_column(column, values);
        }
        Ok(())
    }

    fn derive_cell(
        &self,
        table: &TraceTable,
        row: usize,
        column: &str,
    ) -> Result<String, TraceError> {
        let estimate_source = if self.clock.is_relaxed() {
            table.column_index(RATES_MEAN_COLUMN)
        } else {
            table.column_index(CLOCKRATE_COLUMN)
        };
        let estimate = table.value(row, estimate_source).unwrap_or_default();

        let cell = match column {
            YEARS_COLUMN => {
                let changes = table.number(row, table.column_index(PER_SPLIT_COLUMN));
                match (changes, parse_number(estimate)) {
                    (Some(changes), Some(rate)) if rate != 0.0 => format_number(changes / rate),
                    _ => String::new(),
                }
            }
            CLOCK_STD_COLUMN => {
                match table.number(row, table.column_index(RATES_VARIANCE_COLUMN)) {
                    Some(variance) if variance < 0.0 => {
                        return Err(TraceError::NegativeVariance {
                            row,
                            value: variance,
                        });
                    }
                    Some(variance) => format_number(variance.sqrt()),
                    None => String::new(),
                }
            }
            CLOCKRATE_EST_COLUMN => estimate.to_string(),
            YEARLOSS_COLUMN => table
                .number(row, table.column_index(LOSSRATE_COLUMN))
                .map(|value| format_number(year_loss(value)))
                .unwrap_or_default(),
            _ => String::new(),
        };
        Ok(cell)
    }
}

/// Negative burst sizes are rewritten as zero before anything reads them.
fn clamp_per_split(table: &mut TraceTable) {
    let Some(index) = table.column_index(PER_SPLIT_COLUMN) else {
        return;
    };
    for row in &mut table.rows {
        if let Some(changes) = parse_number(&row[index])
            && changes < 0.0
        {
            row[index] = format_number(0.0);
        }
    }
}

fn format_number(value: f64) -> String {
    format!("{value:?}")
}
