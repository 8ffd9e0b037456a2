use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeEstimateError {
    #[error("failed to read screen log {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no Msample timing lines found in {path}")]
    NoEstimates { path: PathBuf },
    #[error("unrecognized Msample timing `{token}` in {path}")]
    Malformed { path: PathBuf, token: String },
}

/// Hours of wall-clock time per million MCMC samples for one run directory.
pub trait RuntimeEstimator {
    fn hours_per_msample(&self, run_dir: &Path) -> Result<f64, RuntimeEstimateError>;
}

/// Averages the `Msample` timings BEAST prints to its screen log, which the
/// scheduler captures as `*.out` files in the run directory.
#[derive(Debug, Clone)]
pub struct ScreenlogRuntimeEstimator {
    pattern: Regex,
}

impl ScreenlogRuntimeEstimator {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"^(?:(\d+)h)?(\d+)m(\d+)s/Msamples?$")
            .context("failed to compile Msample timing regex")?;
        Ok(Self { pattern })
    }

    /// Minutes per million samples encoded in a `1h23m45s/Msamples` token.
    pub fn parse_minutes(&self, token: &str) -> Option<f64> {
        let captures = self.pattern.captures(token)?;
        let hours = match captures.get(1) {
            Some(value) => value.as_str().parse::<f64>().ok()?,
            None => 0.0,
        };
        let minutes = captures.get(2)?.as_str().parse::<f64>().ok()?;
        let seconds = captures.get(3)?.as_str().parse::<f64>().ok()?;
        Some(hours * 60.0 + minutes + seconds / 60.0)
    }

    fn screen_logs(run_dir: &Path) -> Result<Vec<PathBuf>, RuntimeEstimateError> {
        let entries = fs::read_dir(run_dir).map_err(|source| RuntimeEstimateError::Io {
            path: run_dir.to_path_buf(),
            source,
        })?;

        let mut logs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| RuntimeEstimateError::Io {
                path: run_dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let is_out = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == "out")
                .unwrap_or(false);
            if is_out && path.is_file() {
                logs.push(path);
            }
        }
        logs.sort();
        Ok(logs)
    }
}

impl RuntimeEstimator for ScreenlogRuntimeEstimator {
    fn hours_per_msample(&self, run_dir: &Path) -> Result<f64, RuntimeEstimateError> {
        let mut minutes = Vec::new();
        for path in Self::screen_logs(run_dir)? {
            let raw = fs::read(&path).map_err(|source| RuntimeEstimateError::Io {
                path: path.clone(),
                source,
            })?;
            let text = String::from_utf8_lossy(&raw);
            for line in text.lines().filter(|line| line.contains("Msample")) {
                let Some(token) = line.split_whitespace().last() else {
                    continue;
                };
                let value =
                    self.parse_minutes(token)
                        .ok_or_else(|| RuntimeEstimateError::Malformed {
                            path: path.clone(),
                            token: token.to_string(),
                        })?;
                minutes.push(value);
            }
        }

        if minutes.is_empty() {
            return Err(RuntimeEstimateError::NoEstimates {
                path: run_dir.to_path_buf(),
            });
        }

        Ok(minutes.iter().sum::<f64>() / minutes.len() as f64 / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{RuntimeEstimateError, RuntimeEstimator, ScreenlogRuntimeEstimator};

    #[test]
    fn parse_minutes_supports_optional_hours() {
        let estimator = ScreenlogRuntimeEstimator::new().expect("regex compiles");
        assert_eq!(estimator.parse_minutes("12m30s/Msamples"), Some(12.5));
        assert_eq!(estimator.parse_minutes("1h02m00s/Msamples"), Some(62.0));
        assert_eq!(estimator.parse_minutes("garbage"), None);
    }

    #[test]
    fn hours_per_msample_averages_all_screen_logs() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("slurm-1.out"),
            "Sample  posterior\n1000000  -1234.5  30m00s/Msamples\n",
        )
        .expect("write screen log");
        fs::write(
            dir.path().join("slurm-2.out"),
            "2000000  -1200.0  1h30m00s/Msamples\n",
        )
        .expect("write screen log");
        fs::write(dir.path().join("notes.txt"), "5m00s/Msamples\n").expect("write note");

        let estimator = ScreenlogRuntimeEstimator::new().expect("regex compiles");
        let hours = estimator
            .hours_per_msample(dir.path())
            .expect("estimate available");
        assert!((hours - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hours_per_msample_fails_without_timings() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("slurm-1.out"), "no timing here\n").expect("write");

        let estimator = ScreenlogRuntimeEstimator::new().expect("regex compiles");
        let err = estimator
            .hours_per_msample(dir.path())
            .expect_err("no estimate");
        assert!(matches!(err, RuntimeEstimateError::NoEstimates { .. }));
    }
}
