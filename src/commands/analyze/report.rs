use super::*;

pub(crate) const STATS_MACROS_FILE: &str = "stats.tex";
pub(crate) const RUNTIMES_FILE: &str = "runtimes.json";
pub(crate) const RUN_MANIFEST_FILE: &str = "analysis_run.json";

pub(crate) fn family_summary_path(output_dir: &Path, family: &str) -> PathBuf {
    output_dir.join(format!("{}_summary.json", family_to_path(family)))
}

/// Renders the `\newcommand` macros for the manuscript. Macros without a
/// value are left out and reported in the returned warnings.
pub(crate) fn render_stats_macros(extrema: &CrossFamilyExtrema) -> (String, Vec<String>) {
    let mut out = String::new();
    let mut warnings = Vec::new();

    let mut labeled = |value: &Option<LabeledValue>,
                       number_macro: &str,
                       owner_macro: &str,
                       precision: usize| {
        match value {
            Some(value) => {
                out.push_str(&format!(
                    "\\newcommand{{\\{number_macro}}}{{{:.precision$}}}\n",
                    value.value
                ));
                out.push_str(&format!(
                    "\\newcommand{{\\{owner_macro}}}{{{}}}\n",
                    value.owner
                ));
            }
            None => warnings.push(format!(
                "\\{number_macro} and \\{owner_macro} undefined: no qualifying condition"
            )),
        }
    };

    labeled(&extrema.min_changes_q05, "minx", "minn", 6);
    labeled(&extrema.max_changes_q95, "maxx", "maxn", 6);
    labeled(&extrema.min_burst_ess, "minessx", "minessn", 0);
    labeled(&extrema.max_burst_ess, "maxessx", "maxessn", 0);

    match extrema.worst_burst_odds() {
        Some(odds) => out.push_str(&format!("\\newcommand{{\\worstburst}}{{{odds:.1}}}\n")),
        None => warnings.push("\\worstburst undefined: no burst odds pooled".to_string()),
    }

    (out, warnings)
}

pub(crate) fn runtime_entry(summary: &ConditionSummary, key: &ConditionKey) -> RuntimeEntry {
    RuntimeEntry {
        family: key.family.clone(),
        condition: key.label(),
        complete_compute_hours: summary.complete_compute_hours.clone(),
        incomplete_compute_hours: summary.incomplete_compute_hours.clone(),
    }
}
