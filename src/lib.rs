//! # me-builder
//!
//! A library for building genome-scale Metabolism-and-Expression (ME) models.
//!
//! An ME model extends a metabolic network with the machinery that makes the
//! enzymes: transcription, translation, tRNA charging, folding, translocation
//! and complex formation. Building one means reconciling a genome annotation,
//! a metabolic network and dozens of partially overlapping curation tables,
//! then repairing the draft until it can grow.
//!
//! `me-builder` runs that pipeline deterministically and logs every fallback
//! it takes for a curator to review.
//!
//! ## Features
//!
//! - **Typed curation**: 25 curation kinds, each with an explicit schema
//! - **Precedence**: manual entries beat homology-borrowed ones, which beat umbrella defaults
//! - **Homology borrowing**: copies reference curation through reciprocal best hits
//! - **Full linkage**: every reaction references only indexed species
//! - **Troubleshooting**: diagnose, patch and re-solve until the model grows
//! - **Audit trail**: each patch and fallback is recorded as a curation note
//!
//! ## Example
//!
//! ```rust,no_run
//! use me_builder::parsing::json::{read_curation, read_organism};
//! use me_builder::{BuilderConfig, MEBuilder};
//! use std::path::Path;
//!
//! let inputs = read_organism(Path::new("organism.json")).unwrap();
//! let curation = read_curation(Path::new("curation.json")).unwrap();
//!
//! let output = MEBuilder::new(BuilderConfig::default())
//!     .with_curation("curation.json", curation)
//!     .build(&inputs)
//!     .unwrap();
//!
//! println!("{}", output.model.stats());
//! for record in output.report.records() {
//!     println!("{}: {} -> {}", record.iteration, record.gap, record.patch);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Genes, gene-reaction rules, organism inputs and the ME model
//! - [`curation`]: Curation kinds, the registry and umbrella defaults
//! - [`homology`]: Borrowing curation from a reference organism
//! - [`assembly`]: Draft model assembly
//! - [`troubleshoot`]: LP feasibility, gap diagnosis and patching
//! - [`report`]: Patch records and curation notes
//! - [`builder`]: The end-to-end pipeline
//! - [`parsing`]: JSON and homology table readers
//! - [`cli`]: Command-line interface implementation

pub mod assembly;
pub mod builder;
pub mod cli;
pub mod core;
pub mod curation;
pub mod homology;
pub mod parsing;
pub mod report;
pub mod troubleshoot;
pub mod utils;

// Re-export commonly used types for convenience
pub use builder::{BuildError, BuildOutput, BuilderConfig, MEBuilder};
pub use core::model::{MEModel, ReactionDraft};
pub use core::organism::{OrganismInputs, ReferenceOrganism};
pub use core::types::*;
pub use curation::kinds::{CurationEntry, CurationKind};
pub use curation::registry::CurationRegistry;
pub use homology::HomologyMatch;
pub use report::TroubleshootingReport;
pub use troubleshoot::engine::TroubleshootState;
