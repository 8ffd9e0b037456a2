use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct SampleDiscontinuity {
    pub row: usize,
    pub expected: i64,
    pub found: i64,
}

/// Repairs the `Sample` counter of a resumed chain into an evenly spaced
/// sequence. The step is learned from the first two rows; every later row is
/// emitted as the previous value plus that step, and the raw counter is only
/// used to notice when its offset from that prediction changes.
///
/// One reconciler serves exactly one trace log, fed in file order.
#[derive(Debug, Default, Clone)]
pub(crate) struct SampleIndexReconciler {
    step: Option<i64>,
    previous: Option<i64>,
    deviation: i64,
    row: usize,
}

impl SampleIndexReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, raw: i64) -> Result<(i64, Option<SampleDiscontinuity>), TraceError> {
        let row = self.row;
        self.row += 1;
        let overflow = || TraceError::SampleOverflow { row, value: raw };

        let (previous, step) = match (self.previous, self.step) {
            (None, _) => {
                self.previous = Some(raw);
                return Ok((raw, None));
            }
            (Some(previous), None) => {
                self.step = Some(raw.checked_sub(previous).ok_or_else(overflow)?);
                self.previous = Some(raw);
                return Ok((raw, None));
            }
            (Some(previous), Some(step)) => (previous, step),
        };

        let predicted = previous.checked_add(step).ok_or_else(overflow)?;
        let deviation = raw.checked_sub(predicted).ok_or_else(overflow)?;
        self.previous = Some(predicted);
        if deviation == self.deviation {
            return Ok((predicted, None));
        }

        let discontinuity = SampleDiscontinuity {
            row,
            expected: predicted.checked_add(self.deviation).ok_or_else(overflow)?,
            found: raw,
        };
        self.deviation = deviation;
        Ok((predicted, Some(discontinuity)))
    }
}

/// Rewrites the `Sample` column of `table` in place and returns every
/// discontinuity that was repaired.
pub(crate) fn reconcile_samples(
    table: &mut TraceTable,
) -> Result<Vec<SampleDiscontinuity>, TraceError> {
    let index = table
        .column_index(SAMPLE_COLUMN)
        .ok_or_else(|| TraceError::MissingColumn(SAMPLE_COLUMN.to_string()))?;

    let mut reconciler = SampleIndexReconciler::new();
    let mut discontinuities = Vec::new();
    for (row_number, row) in table.rows.iter_mut().enumerate() {
        let raw = parse_sample(row_number, &row[index])?;
        let (sample, discontinuity) = reconciler.push(raw)?;
        row[index] = sample.to_string();
        discontinuities.extend(discontinuity);
    }

    Ok(discontinuities)
}
