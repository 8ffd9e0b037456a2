use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cli::{AnalyzeArgs, ClockModel, DEFAULT_FAMILIES};
use crate::model::{
    AnalysisConfig, AnalysisRunManifest, ConditionKey, ConditionSummary, FamilySummary,
    LabeledValue, ReplicateRecord, ReplicateVerdict, RuntimeEntry, RuntimeTable,
};
use crate::runtime::RuntimeEstimator;
use crate::stats::{ConvergenceStatistic, mean, quantiles, summarize};
use crate::util::{
    ensure_directory, family_to_path, now_utc_string, relative_display, sha256_file,
    utc_compact_string, write_json_pretty, write_text,
};

const TRACE_FILE_NAME: &str = "vocabulary.log";
const RECONCILED_EXTENSION: &str = "log2";

mod aggregate;
mod gate;
mod metrics;
mod reconcile;
mod report;
mod run;
mod summary;
mod trace_io;

pub use run::run;

pub(crate) use aggregate::*;
pub(crate) use gate::*;
pub(crate) use metrics::*;
pub(crate) use reconcile::*;
pub(crate) use report::*;
pub(crate) use summary::*;
pub(crate) use trace_io::*;
