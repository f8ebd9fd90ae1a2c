//! Homology-based borrowing of curation from a reference organism.
//!
//! Matches come from an external reciprocal best hit search. The mapper keeps
//! the best match per organism gene and copies reference entries the
//! organism does not curate itself, rewriting gene ids along the way.

pub mod mapper;

pub use mapper::{BorrowedEntry, HomologyError, HomologyMapper, HomologyMatch};
