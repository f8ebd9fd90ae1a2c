//! Command-line interface for me-builder.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **build**: Run the full pipeline and write the model plus its curation notes
//! - **check**: Load and validate inputs, curation and the draft model without solving
//! - **kinds**: List the curation kinds and their primary keys
//!
//! ## Usage
//!
//! ```text
//! # Build from organism inputs and manual curation
//! me-builder build organism.json --curation curation.json -o model.json
//!
//! # Borrow missing curation from a reference organism
//! me-builder build organism.json --curation curation.json \
//!     --homology rbh.tsv --reference ecoli.json.gz --notes notes.txt
//!
//! # Validate inputs only
//! me-builder check organism.json --curation curation.json --format json
//!
//! # Which curation tables exist
//! me-builder kinds
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::builder::{BuilderConfig, MEBuilder};
use crate::core::organism::OrganismInputs;
use crate::curation::defaults::UmbrellaDefaults;
use crate::parsing;

pub mod build;
pub mod check;
pub mod kinds;

#[derive(Parser)]
#[command(name = "me-builder")]
#[command(author)]
#[command(version)]
#[command(about = "Build and troubleshoot genome-scale ME models")]
#[command(
    long_about = "me-builder reconstructs a Metabolism-and-Expression model from a genome annotation, a metabolic network and curation tables.\n\nIt merges manual curation, homology-borrowed entries and umbrella defaults, assembles the expression machinery and repairs the draft until it grows:\n- Manual curation always wins over borrowed or default entries\n- Every fallback and patch is logged as a curation note\n- Builds are deterministic for identical inputs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a feasible ME model
    Build(build::BuildArgs),

    /// Validate inputs and curation without solving
    Check(check::CheckArgs),

    /// List curation kinds
    Kinds(kinds::KindsArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Inputs shared by `build` and `check`
#[derive(Args)]
pub struct InputArgs {
    /// Organism inputs (JSON, optionally .gz): annotation, transcription units, network
    #[arg(required = true)]
    pub organism: PathBuf,

    /// Manual curation table (JSON); repeat to layer sources, later ones win
    #[arg(short, long)]
    pub curation: Vec<PathBuf>,

    /// Reciprocal best hits against the reference organism (TSV)
    #[arg(long, requires = "reference")]
    pub homology: Option<PathBuf>,

    /// Reference organism with curation to borrow from (JSON)
    #[arg(long, requires = "homology")]
    pub reference: Option<PathBuf>,

    /// Builder config (JSON); flags below override its fields
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Custom umbrella defaults catalog instead of the embedded one
    #[arg(long)]
    pub defaults: Option<PathBuf>,

    /// Growth flux the feasibility test pins
    #[arg(long)]
    pub growth_probe: Option<f64>,

    /// Maximum e-value of an accepted homology match
    #[arg(long)]
    pub evalue_cutoff: Option<f64>,

    /// Cap on troubleshooting iterations
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// LP backend
    #[arg(long)]
    pub solver: Option<String>,

    /// Fail on unparseable gene-reaction rules
    #[arg(long)]
    pub strict_gene_rules: bool,
}

impl InputArgs {
    /// Config file plus flag overrides
    fn config(&self) -> anyhow::Result<BuilderConfig> {
        let mut config = match &self.config {
            Some(path) => BuilderConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => BuilderConfig::default(),
        };
        if let Some(probe) = self.growth_probe {
            config.growth_probe = probe;
        }
        if let Some(cutoff) = self.evalue_cutoff {
            config.evalue_cutoff = cutoff;
        }
        if let Some(cap) = self.max_iterations {
            config.max_iterations = cap;
        }
        if let Some(solver) = &self.solver {
            config.solver.clone_from(solver);
        }
        if self.strict_gene_rules {
            config.strict_gene_rules = true;
        }
        config.validate().context("Invalid builder configuration")?;
        Ok(config)
    }

    /// Read every input file and set up a builder
    pub fn load(&self) -> anyhow::Result<(MEBuilder, OrganismInputs)> {
        let inputs = parsing::json::read_organism(&self.organism)
            .with_context(|| format!("Failed to read organism inputs {}", self.organism.display()))?;

        let mut builder = MEBuilder::new(self.config()?);
        for path in &self.curation {
            let entries = parsing::json::read_curation(path)
                .with_context(|| format!("Failed to read curation {}", path.display()))?;
            builder = builder.with_curation(path.display().to_string(), entries);
        }

        if let (Some(homology), Some(reference)) = (&self.homology, &self.reference) {
            let matches = parsing::homology::parse_homology_file(homology)
                .with_context(|| format!("Failed to read homology table {}", homology.display()))?;
            let reference = parsing::json::read_reference(reference)
                .with_context(|| format!("Failed to read reference organism {}", reference.display()))?;
            builder = builder.with_homology(matches, reference);
        }

        if let Some(path) = &self.defaults {
            let defaults = UmbrellaDefaults::load_from_file(path)
                .with_context(|| format!("Failed to load umbrella defaults {}", path.display()))?;
            builder = builder.with_defaults(defaults);
        }

        Ok((builder, inputs))
    }
}
