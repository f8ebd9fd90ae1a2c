//! Draft ME-model assembly.
//!
//! [`ModelAssembler`] turns organism inputs plus a filled
//! [`CurationRegistry`](crate::curation::registry::CurationRegistry) into a
//! fully linked [`MEModel`](crate::core::model::MEModel):
//!
//! - **Machinery**: subreactions, curated complexes, the ribosome, RNA
//!   polymerase holoenzymes, modified complexes and generic components
//! - **Expression**: transcription per unit, translation, tRNA charging,
//!   folding, translocation and RNA degradation per gene
//! - **Metabolism**: one reaction per isozyme and direction of every network
//!   reaction, catalysed by a curated or generated complex
//! - **Dummy complex**: every protein that ends up in no complex is consumed
//!   by `formation_CPLX_dummy`
//!
//! Every fallback taken along the way is returned as a
//! [`CurationNote`](crate::report::CurationNote).
//!
//! ## Example
//!
//! ```rust,ignore
//! use me_builder::assembly::{AssemblyOptions, ModelAssembler};
//!
//! let assembler = ModelAssembler::new(&registry, AssemblyOptions::default());
//! let assembly = assembler.build(&inputs)?;
//! println!("{}", assembly.model.stats());
//! ```

pub mod assembler;
mod expression;
mod machinery;

use thiserror::Error;

use crate::core::gpr::GprError;
use crate::core::model::{DanglingLink, MEModel};
use crate::report::CurationNote;
use crate::troubleshoot::engine::{DEFAULT_FLUX_BOUND, DEFAULT_KEFF};

pub use assembler::ModelAssembler;

#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("Gene-reaction rule of {reaction} cannot be parsed: {source}")]
    AmbiguousGeneRule {
        reaction: String,
        rule: String,
        #[source]
        source: GprError,
    },

    #[error("Transcription unit {unit} lists unknown gene {gene}")]
    UnknownUnitGene { unit: String, gene: String },

    #[error("Assembled model has {} unresolved links, first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    DanglingLinks(Vec<DanglingLink>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyOptions {
    /// keff of expression machinery and subreactions without a curated one
    pub default_keff: f64,

    /// Upper bound of reactions the network leaves unbounded
    pub flux_bound: f64,

    /// Fail on an unparseable gene-reaction rule instead of flagging it
    pub strict_gene_rules: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            default_keff: DEFAULT_KEFF,
            flux_bound: DEFAULT_FLUX_BOUND,
            strict_gene_rules: false,
        }
    }
}

/// A draft model and the fallbacks taken to build it
#[derive(Debug, Clone)]
pub struct Assembly {
    pub model: MEModel,
    pub notes: Vec<CurationNote>,
}
