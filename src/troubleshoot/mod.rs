//! Growth-feasibility troubleshooting.
//!
//! A draft ME model is rarely feasible: curation leaves metabolites without
//! producers, complexes without formation reactions and catalysed reactions
//! without a keff. The [`FeasibilityTroubleshooter`](engine::FeasibilityTroubleshooter)
//! runs a loop that:
//!
//! 1. builds an [`LpProblem`](problem::LpProblem) with growth pinned at a small probe flux
//! 2. solves it with an [`LpSolver`](problem::LpSolver) backend
//! 3. on infeasibility, ranks structural [`Gap`](diagnosis::Gap)s on the growth path
//! 4. applies the permissive [`Patch`](engine::Patch) for the highest ranked untried gap
//!
//! Patches only relax the model, so a model that becomes feasible stays
//! feasible, and each gap is patched at most once.
//!
//! ## Example
//!
//! ```rust,ignore
//! use me_builder::report::TroubleshootingReport;
//! use me_builder::troubleshoot::engine::{FeasibilityTroubleshooter, TroubleshootOptions};
//! use me_builder::troubleshoot::clarabel::ClarabelSolver;
//!
//! let solver = ClarabelSolver::default();
//! let troubleshooter = FeasibilityTroubleshooter::new(&solver, TroubleshootOptions::default());
//! let mut report = TroubleshootingReport::new();
//! let outcome = troubleshooter.run(&mut model, &mut report)?;
//! println!("{} after {} patches", outcome.state, outcome.iterations);
//! ```

pub mod clarabel;
pub mod diagnosis;
pub mod engine;
pub mod problem;
