//! Readers for the already-structured build inputs.
//!
//! This module provides readers for:
//!
//! - **JSON documents**: organism inputs, curation tables, reference organisms
//!   and builder configs, plain or gzip compressed (`.json.gz`)
//! - **Homology tables**: tab-separated reciprocal best hits, either
//!   `organism_gene, reference_gene, score[, evalue]` or BLAST outfmt 6
//!
//! ## Example
//!
//! ```rust,no_run
//! use me_builder::parsing::homology::parse_homology_file;
//! use me_builder::parsing::json::read_organism;
//! use std::path::Path;
//!
//! let inputs = read_organism(Path::new("organism.json.gz")).unwrap();
//! let matches = parse_homology_file(Path::new("rbh.tsv")).unwrap();
//! ```

pub mod homology;
pub mod json;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid homology table: {0}")]
    InvalidFormat(String),

    #[error("Too many homology matches: {0} exceeds maximum allowed (5000000)")]
    TooManyMatches(usize),
}
