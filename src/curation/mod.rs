//! Typed curation tables and their precedence rules.
//!
//! Curation supplies the mechanistic detail a genome annotation cannot: which
//! genes form the ribosome, which enzyme charges each tRNA, which pathway
//! moves a protein across the membrane. Every record is one variant of
//! [`CurationEntry`](kinds::CurationEntry), tagged with its
//! [`CurationKind`](kinds::CurationKind).
//!
//! ## Sources
//!
//! Entries reach the [`CurationRegistry`](registry::CurationRegistry) from
//! three places, strongest first:
//!
//! 1. **Manual**: the organism's own tables, loaded with `load`
//! 2. **Homology**: entries borrowed from a reference organism
//! 3. **Generated**: the embedded [`UmbrellaDefaults`](defaults::UmbrellaDefaults)
//!
//! A weaker source never replaces an entry registered by a stronger one.
//!
//! ## Example
//!
//! ```rust
//! use me_builder::curation::defaults::UmbrellaDefaults;
//! use me_builder::curation::kinds::CurationKind;
//! use me_builder::curation::registry::CurationRegistry;
//!
//! let mut registry = CurationRegistry::new();
//! let defaults = UmbrellaDefaults::load_embedded().unwrap();
//! defaults.fill(&mut registry);
//!
//! assert!(registry.get(CurationKind::RnaPolymerase, "RNAP_generic").is_some());
//! ```

pub mod defaults;
pub mod kinds;
pub mod registry;
