use super::*;

use crate::runtime::ScreenlogRuntimeEstimator;
use crate::stats::GeyerEss;

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("analysis-{}", utc_compact_string(started_ts));

    let gate = GateConfig::new(args.burnin, args.ess_threshold)?;
    if args.replicates == 0 {
        bail!("--replicates must be at least 1");
    }
    let families: Vec<String> = if args.families.is_empty() {
        DEFAULT_FAMILIES.iter().map(|family| family.to_string()).collect()
    } else {
        args.families.clone()
    };
    let base_dir = args
        .base_dir
        .clone()
        .unwrap_or_else(|| args.runs_root.clone());
    let config = AnalysisConfig {
        runs_root: args.runs_root.display().to_string(),
        base_dir: base_dir.display().to_string(),
        families: families.clone(),
        burnin: gate.burnin,
        ess_threshold: gate.ess_threshold,
        replicates: args.replicates,
        output_dir: args.output_dir.display().to_string(),
    };

    info!(
        run_id = %run_id,
        runs_root = %args.runs_root.display(),
        families = families.len(),
        burnin = gate.burnin,
        ess_threshold = gate.ess_threshold,
        "starting analysis"
    );

    ensure_directory(&args.output_dir)?;

    let statistic = GeyerEss;
    let estimator = ScreenlogRuntimeEstimator::new()?;
    let pipeline = Pipeline {
        gate,
        base_dir: &base_dir,
        statistic: &statistic,
        runtime: &estimator,
        print_expected: args.print_expected,
    };

    let mut extrema = CrossFamilyExtrema::default();
    let mut runtime_entries = Vec::new();
    let mut replicate_records = Vec::new();
    let mut warnings = Vec::new();

    for family in &families {
        let family_dir = args.runs_root.join(family_to_path(family));
        if !family_dir.is_dir() {
            error!(family = %family, path = %family_dir.display(), "family directory missing");
            warnings.push(format!("family {family}: directory {} missing", family_dir.display()));
            continue;
        }

        let mut conditions = BTreeMap::new();
        for key in ConditionKey::all_for(family) {
            let (aggregate, records) =
                pipeline.aggregate_condition(&family_dir, &key, args.replicates);
            replicate_records.extend(records);

            if aggregate.converged_replicates == 0 {
                error!(
                    family = %family,
                    condition = %key.label(),
                    unconverged = aggregate.unconverged_replicates,
                    "no converged replicates"
                );
                warnings.push(format!(
                    "family {family} ({}): no converged replicates",
                    key.label()
                ));
            }

            let summary = build_condition_summary(&aggregate);
            runtime_entries.push(runtime_entry(&summary, &key));
            if key.bursts && !extrema.observe(&key, &summary) {
                error!(
                    family = %family,
                    condition = %key.label(),
                    "family does not have converged burst data"
                );
                warnings.push(format!(
                    "family {family} ({}): no converged perSplit draws",
                    key.label()
                ));
            }

            info!(
                family = %family,
                condition = %key.label(),
                converged = summary.converged_replicates,
                unconverged = summary.unconverged_replicates,
                tree_height_draws = summary.tree_height.len(),
                "condition summarized"
            );
            conditions.insert(key.label(), summary);
        }

        let family_summary = FamilySummary {
            family: family.clone(),
            generated_at: now_utc_string(),
            conditions,
        };
        let summary_path = family_summary_path(&args.output_dir, family);
        write_json_pretty(&summary_path, &family_summary)?;
        info!(family = %family, path = %summary_path.display(), "wrote family summary");
    }

    let runtimes_path = args.output_dir.join(RUNTIMES_FILE);
    write_json_pretty(
        &runtimes_path,
        &RuntimeTable {
            generated_at: now_utc_string(),
            entries: runtime_entries,
        },
    )?;
    info!(path = %runtimes_path.display(), "wrote runtime table");

    let (macros, macro_warnings) = render_stats_macros(&extrema);
    for warning in &macro_warnings {
        warn!(warning = %warning, "report macro omitted");
    }
    warnings.extend(macro_warnings);
    let macros_path = args.output_dir.join(STATS_MACROS_FILE);
    write_text(&macros_path, &macros)?;
    info!(path = %macros_path.display(), "wrote report macros");

    let converged = replicate_records
        .iter()
        .filter(|record| record.verdict == ReplicateVerdict::Converged)
        .count();
    let manifest = AnalysisRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        started_at,
        finished_at: now_utc_string(),
        command: std::env::args().collect::<Vec<String>>().join(" "),
        config,
        replicates: replicate_records,
        warnings,
    };
    let manifest_path = args.output_dir.join(RUN_MANIFEST_FILE);
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        run_id = %run_id,
        replicates = manifest.replicates.len(),
        converged,
        warnings = manifest.warnings.len(),
        path = %manifest_path.display(),
        "analysis completed"
    );

    Ok(())
}
