//! Check command - validate inputs, curation and the draft model without solving.

use anyhow::Context;
use clap::Args;

use crate::cli::{InputArgs, OutputFormat};
use crate::curation::kinds::CurationKind;
use crate::curation::registry::EntryOrigin;

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
}

/// Execute the check command
///
/// # Errors
///
/// Returns an error if inputs cannot be read or the draft cannot be assembled.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: CheckArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (builder, inputs) = args.inputs.load()?;
    let draft = builder
        .draft(&inputs)
        .with_context(|| format!("Inputs for {} do not assemble", inputs.id))?;

    let origins: Vec<(CurationKind, usize, usize, usize)> = CurationKind::ALL
        .into_iter()
        .map(|kind| {
            let counts = draft.registry.origin_counts(kind);
            let count = |origin: EntryOrigin| counts.get(&origin).copied().unwrap_or(0);
            (
                kind,
                count(EntryOrigin::Manual),
                count(EntryOrigin::Homology),
                count(EntryOrigin::Generated),
            )
        })
        .collect();

    match format {
        OutputFormat::Text => {
            println!("Inputs for {} assemble into a linked draft", inputs.id);
            println!();
            println!("{}", draft.model.stats());
            println!();
            println!("{:<28} {:>7} {:>9} {:>10}", "Kind", "Manual", "Homology", "Generated");
            println!("{}", "-".repeat(57));
            for (kind, manual, homology, generated) in &origins {
                if !verbose && manual + homology + generated == 0 {
                    continue;
                }
                println!("{:<28} {manual:>7} {homology:>9} {generated:>10}", kind.as_str());
            }
            println!();
            println!("Curation notes: {}", draft.report.notes().len());
            if verbose {
                for note in draft.report.notes() {
                    println!("  [{}] {}: {}", note.importance, note.triggered_by, note.msg);
                }
            }
        }
        OutputFormat::Json => {
            let kinds: Vec<serde_json::Value> = origins
                .iter()
                .map(|(kind, manual, homology, generated)| {
                    serde_json::json!({
                        "kind": kind,
                        "manual": manual,
                        "homology": homology,
                        "generated": generated,
                    })
                })
                .collect();
            let output = serde_json::json!({
                "organism": inputs.id,
                "stats": draft.model.stats(),
                "curation": kinds,
                "notes": draft.report.notes(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("kind\tmanual\thomology\tgenerated");
            for (kind, manual, homology, generated) in &origins {
                println!("{}\t{manual}\t{homology}\t{generated}", kind.as_str());
            }
        }
    }

    Ok(())
}
