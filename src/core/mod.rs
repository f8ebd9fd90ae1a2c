//! Core data types for ME-model construction.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`GeneRecord`](gene::GeneRecord), [`TranscriptionUnit`](gene::TranscriptionUnit): the genome annotation
//! - [`GeneRule`](gpr::GeneRule): parsed gene-reaction rules and their DNF isozymes
//! - [`OrganismInputs`](organism::OrganismInputs): annotation plus metabolic network for one organism
//! - [`MEModel`](model::MEModel), [`ReactionDraft`](model::ReactionDraft): the assembled network
//! - [`ProductType`](types::ProductType), [`SpeciesKind`](types::SpeciesKind): classification types
//!
//! ## Species naming
//!
//! Expression machinery follows a fixed naming scheme so curation entries can
//! refer to gene products without knowing how they are produced:
//!
//! | Species | Id |
//! |---------|----|
//! | transcript of gene `g` | `RNA_g` |
//! | translated protein | `protein_g` |
//! | folded protein | `protein_g_folded` |
//! | protein in compartment `c` | `protein_g_c` |
//! | charged tRNA for residue `X` | `generic_tRNA_X` |
//! | sigma holoenzyme | `RNAP_sigma` |
//!
//! A bare gene id used as a complex component resolves to the mature form of
//! that gene's product.

pub mod gene;
pub mod gpr;
pub mod model;
pub mod organism;
pub mod types;
