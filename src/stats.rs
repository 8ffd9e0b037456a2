use serde::Serialize;

/// Effective sample size of an autocorrelated chain.
pub trait ConvergenceStatistic {
    fn effective_sample_size(&self, series: &[f64]) -> f64;
}

impl<F> ConvergenceStatistic for F
where
    F: Fn(&[f64]) -> f64,
{
    fn effective_sample_size(&self, series: &[f64]) -> f64 {
        self(series)
    }
}

/// ESS = n / tau, with the integrated autocorrelation time tau truncated by
/// Geyer's initial monotone positive-sequence estimator.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeyerEss;

impl ConvergenceStatistic for GeyerEss {
    fn effective_sample_size(&self, series: &[f64]) -> f64 {
        let n = series.len();
        if n < 4 {
            return n as f64;
        }

        let mean = series.iter().sum::<f64>() / n as f64;
        let gamma0 = autocovariance(series, mean, 0);
        if !gamma0.is_finite() || gamma0 <= 1e-300 {
            return n as f64;
        }

        let mut pair_sum = 0.0_f64;
        let mut previous_pair = f64::INFINITY;
        let mut lag = 0;
        while lag + 1 < n {
            let rho_even = autocovariance(series, mean, lag) / gamma0;
            let rho_odd = autocovariance(series, mean, lag + 1) / gamma0;
            let pair = rho_even + rho_odd;
            if pair <= 0.0 {
                break;
            }
            // monotone sequence
            let pair = pair.min(previous_pair);
            pair_sum += pair;
            previous_pair = pair;
            lag += 2;
        }

        let tau = -1.0 + 2.0 * pair_sum;
        if tau <= 0.0 || !tau.is_finite() {
            return n as f64;
        }
        (n as f64 / tau).max(0.0)
    }
}

fn autocovariance(series: &[f64], mean: f64, lag: usize) -> f64 {
    let n = series.len();
    series[..n - lag]
        .iter()
        .zip(&series[lag..])
        .map(|(a, b)| (a - mean) * (b - mean))
        .sum::<f64>()
        / n as f64
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance =
        values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Quantiles by linear interpolation between order statistics.
pub fn quantiles(values: &[f64], probabilities: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|left, right| left.total_cmp(right));
    let last = sorted.len() - 1;

    Some(
        probabilities
            .iter()
            .map(|probability| {
                let position = probability.clamp(0.0, 1.0) * last as f64;
                let low = position.floor() as usize;
                let high = position.ceil() as usize;
                sorted[low] + (sorted[high] - sorted[low]) * (position - low as f64)
            })
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub q05: f64,
    pub q50: f64,
    pub q95: f64,
    pub mean: f64,
    pub std: f64,
}

pub fn summarize(values: &[f64]) -> Option<SeriesSummary> {
    let q = quantiles(values, &[0.05, 0.5, 0.95])?;
    Some(SeriesSummary {
        count: values.len(),
        q05: q[0],
        q50: q[1],
        q95: q[2],
        mean: mean(values)?,
        std: std_dev(values)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcg_series(len: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state % 10_000) as f64 / 10_000.0
            })
            .collect()
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        let q = quantiles(&values, &[0.0, 0.5, 1.0, 0.1]).expect("non-empty");
        assert_eq!(q[0], 1.0);
        assert_eq!(q[1], 3.0);
        assert_eq!(q[2], 5.0);
        assert!((q[3] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn empty_series_have_no_statistics() {
        assert!(quantiles(&[], &[0.5]).is_none());
        assert!(mean(&[]).is_none());
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn summarize_reports_population_std() {
        let summary = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).expect("non-empty");
        assert_eq!(summary.count, 8);
        assert!((summary.mean - 5.0).abs() < 1e-12);
        assert!((summary.std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn geyer_ess_is_close_to_length_for_independent_draws() {
        let series = lcg_series(2_000, 0x9E37_79B9_7F4A_7C15);
        let ess = GeyerEss.effective_sample_size(&series);
        assert!(ess > 1_000.0, "ess was {ess}");
    }

    #[test]
    fn geyer_ess_penalises_autocorrelation() {
        let noise = lcg_series(2_000, 42);
        let mut series = Vec::with_capacity(noise.len());
        let mut state = 0.0;
        for value in noise {
            state = 0.95 * state + value;
            series.push(state);
        }
        let ess = GeyerEss.effective_sample_size(&series);
        assert!(ess > 0.0);
        assert!(ess < 400.0, "ess was {ess}");
    }

    #[test]
    fn geyer_ess_handles_degenerate_series() {
        assert_eq!(GeyerEss.effective_sample_size(&[]), 0.0);
        assert_eq!(GeyerEss.effective_sample_size(&[1.0, 2.0]), 2.0);
        assert_eq!(GeyerEss.effective_sample_size(&[3.0; 50]), 50.0);
    }

    #[test]
    fn closures_act_as_convergence_statistics() {
        let fixed = |_: &[f64]| 123.0;
        assert_eq!(fixed.effective_sample_size(&[1.0]), 123.0);
    }
}
