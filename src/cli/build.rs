use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::builder::{BuildError, BuildOutput};
use crate::cli::{InputArgs, OutputFormat};
use crate::parsing::json::write_text;
use crate::report::{Importance, TroubleshootingReport};

/// Arguments for the build command
#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Write the model here (JSON, .gz to compress)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the curation notes log here
    #[arg(long)]
    pub notes: Option<PathBuf>,

    /// Write the full troubleshooting report here (JSON)
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl BuildArgs {
    fn write_report(&self, report: &TroubleshootingReport) -> anyhow::Result<()> {
        if let Some(path) = &self.notes {
            write_text(path, &report.render_log())
                .with_context(|| format!("Failed to write notes {}", path.display()))?;
        }
        if let Some(path) = &self.report {
            write_text(path, &report.to_json()?)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
        }
        Ok(())
    }
}

/// Execute the build command
///
/// # Errors
///
/// Returns an error if inputs cannot be read, the build fails, or outputs
/// cannot be written. An unresolved model still gets its notes and report
/// written before the error is returned.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: BuildArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (builder, inputs) = args.inputs.load()?;

    if verbose {
        eprintln!(
            "Building {} ({} genes, {} network reactions)",
            inputs.id,
            inputs.genes.len(),
            inputs.network.reactions.len()
        );
    }

    let output = match builder.build(&inputs) {
        Ok(output) => output,
        Err(BuildError::UnresolvedInfeasibility { report }) => {
            args.write_report(&report)?;
            eprint!("{}", report.render_log());
            anyhow::bail!(
                "Model for {} is still infeasible after {} troubleshooting iterations",
                inputs.id,
                report.iterations()
            );
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to build model for {}", inputs.id)),
    };

    if let Some(path) = &args.output {
        write_text(path, &output.model.to_json()?)
            .with_context(|| format!("Failed to write model {}", path.display()))?;
    }
    args.write_report(&output.report)?;

    match format {
        OutputFormat::Text => print_text(&output, verbose),
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "model": output.model.id,
                "signature": output.model.signature(),
                "state": output.outcome.state,
                "iterations": output.outcome.iterations,
                "stats": output.model.stats(),
                "records": output.report.records(),
                "notes": output.report.notes().len(),
                "curation": output.registry_summary(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Tsv => {
            println!("iteration\tgap\ttarget\tpatch\tfeasible");
            for record in output.report.records() {
                println!(
                    "{}\t{:?}\t{}\t{}\t{}",
                    record.iteration, record.gap.kind, record.gap.target, record.patch, record.feasible
                );
            }
        }
    }

    Ok(())
}

fn print_text(output: &BuildOutput, verbose: bool) {
    println!("Model: {}", output.model.id);
    println!("Signature: {}", output.model.signature());
    println!("State: {}", output.outcome.state);
    println!();
    println!("{}", output.model.stats());
    println!();

    let records = output.report.records();
    if records.is_empty() {
        println!("Feasible without troubleshooting");
    } else {
        println!("Troubleshooting ({} iterations)", records.len());
        for record in records {
            let outcome = if record.feasible { "feasible" } else { "infeasible" };
            println!("  {:>3}. {} -> {} [{}]", record.iteration, record.gap, record.patch, outcome);
        }
    }

    let review = output.report.notes_at_least(Importance::High).count();
    println!();
    println!(
        "Curation notes: {} ({} high or critical)",
        output.report.notes().len(),
        review
    );
    if verbose {
        for note in output.report.notes_at_least(Importance::High) {
            println!("  [{}] {}: {}", note.importance, note.triggered_by, note.msg);
        }
    }
}
