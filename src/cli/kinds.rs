use clap::Args;

use crate::cli::OutputFormat;
use crate::curation::defaults::UmbrellaDefaults;
use crate::curation::kinds::CurationKind;

/// Arguments for the kinds command
#[derive(Args)]
pub struct KindsArgs {
    /// Only list kinds the embedded umbrella defaults cover
    #[arg(long)]
    pub with_defaults: bool,
}

/// Execute the kinds command
///
/// # Errors
///
/// Returns an error if the embedded defaults catalog cannot be loaded.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: KindsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let defaults = UmbrellaDefaults::load_embedded()?;
    let kinds: Vec<CurationKind> = CurationKind::ALL
        .into_iter()
        .filter(|kind| !args.with_defaults || !defaults.entries(*kind).is_empty())
        .collect();

    match format {
        OutputFormat::Text => {
            println!("Curation kinds ({})\n", kinds.len());
            println!("{:<28} {:<32} {:>10} {:>9}", "Kind", "Key", "Borrowable", "Defaults");
            println!("{}", "-".repeat(82));
            for kind in &kinds {
                println!(
                    "{:<28} {:<32} {:>10} {:>9}",
                    kind.as_str(),
                    kind.key_description(),
                    if kind.is_borrowable() { "yes" } else { "no" },
                    defaults.entries(*kind).len()
                );
                if verbose {
                    for entry in defaults.entries(*kind) {
                        println!("  └─ {}", entry.key());
                    }
                }
            }
        }
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = kinds
                .iter()
                .map(|kind| {
                    serde_json::json!({
                        "kind": kind,
                        "key": kind.key_description(),
                        "gene_keyed": kind.is_gene_keyed(),
                        "borrowable": kind.is_borrowable(),
                        "defaults": defaults.entries(*kind).len(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("kind\tkey\tgene_keyed\tborrowable\tdefaults");
            for kind in &kinds {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    kind.as_str(),
                    kind.key_description(),
                    kind.is_gene_keyed(),
                    kind.is_borrowable(),
                    defaults.entries(*kind).len()
                );
            }
        }
    }

    Ok(())
}
