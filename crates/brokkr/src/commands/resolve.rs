//! Resolve command

use anyhow::Result;
use brokkr_core::{BrokkrConfig, SchemaValidator};
use brokkr_modules::{Bootstrap, BootstrapOutcome, RecordingHost};
use camino::Utf8Path;
use tracing::info;

use crate::cli::ResolveArgs;
use crate::output;

pub fn run(args: ResolveArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let validator = SchemaValidator::new()?;
    let config = BrokkrConfig::load_and_validate(config_path, &validator)?;

    info!(
        "Resolving modules in {} against {}",
        config.module_root(),
        config.registry_path()
    );
    let bootstrap = Bootstrap::from_config(config)?;
    let mut host = RecordingHost::new();
    let outcome = bootstrap.run(&mut host)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&bootstrap, &outcome);
    }

    Ok(())
}

fn print_outcome(bootstrap: &Bootstrap, outcome: &BootstrapOutcome) {
    let report = &outcome.report;

    output::header("Resolution");
    output::kv("Module root", &bootstrap.config().module_root().to_string());
    output::kv("Capability", bootstrap.config().capability());
    output::kv("Duration", &format!("{}ms", report.duration_ms()));

    output::header("Modules");
    if report.outcomes.is_empty() {
        output::info("No active modules");
    }
    for module in &report.outcomes {
        let label = format!("{} {}", module.module.name, module.module.version);
        match &module.error {
            None => output::success(&label),
            Some(err) => output::error(&format!("{}: {}", label, err)),
        }
    }

    if !report.entry_points.is_empty() {
        output::header("Entry points");
        for entry_point in &report.entry_points {
            println!("  {}", entry_point);
        }
    }

    for warning in &report.warnings {
        output::warning(&warning.to_string());
    }
    for error in &report.errors {
        output::error(&error.to_string());
    }
    for error in &outcome.plan.errors {
        output::error(error);
    }

    println!();
    let rejected = report.rejected().count();
    if rejected == 0 && outcome.plan.errors.is_empty() {
        output::success(&format!("{} module(s) resolved", report.resolved().len()));
    } else {
        output::warning(&format!(
            "{} module(s) resolved, {} rejected",
            report.resolved().len(),
            rejected
        ));
    }
}
