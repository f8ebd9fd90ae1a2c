use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::model::{MEModel, ReactionDraft, ReactionFlag, ReactionKind};
use crate::core::types::{SpeciesKind, DUMMY_COMPLEX};
use crate::report::{Importance, PatchRecord, TroubleshootingReport};
use crate::troubleshoot::diagnosis::{diagnose, Gap, GapKind};
use crate::troubleshoot::problem::{LpProblem, LpSolver, ProblemOptions, SolverError};

/// Default cap on troubleshooting iterations
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Default flux the growth reaction is fixed at while testing feasibility
pub const DEFAULT_GROWTH_PROBE: f64 = 0.001;

/// keff applied when the model has no curated keff to take a median of
pub const DEFAULT_KEFF: f64 = 65.0;

/// Default magnitude treated as an unbounded flux
pub const DEFAULT_FLUX_BOUND: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TroubleshootState {
    Draft,
    Solving,
    Feasible,
    Infeasible,
    Diagnosing,
    Patching,
    Done,
    Unresolved,
}

impl std::fmt::Display for TroubleshootState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Draft => "draft",
            Self::Solving => "solving",
            Self::Feasible => "feasible",
            Self::Infeasible => "infeasible",
            Self::Diagnosing => "diagnosing",
            Self::Patching => "patching",
            Self::Done => "done",
            Self::Unresolved => "unresolved",
        };
        write!(f, "{name}")
    }
}

/// A model change that only adds permissiveness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Patch {
    /// Open a zero-bounded producer up to the flux bound
    RelaxBound { reaction: String, upper_bound: f64 },
    /// Generic producer `SK_{species}`
    AddSink { reaction: String, species: String },
    /// Formation of a complex from the placeholder complex
    AddFormation { reaction: String, complex: String },
    SetKeff { reaction: String, keff: f64 },
    /// Drain `DM_{species}`
    AddDemand { reaction: String, species: String },
}

impl std::fmt::Display for Patch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RelaxBound {
                reaction,
                upper_bound,
            } => write!(f, "relax {reaction} upper bound to {upper_bound}"),
            Self::AddSink { reaction, .. } => write!(f, "add sink {reaction}"),
            Self::AddFormation { reaction, .. } => write!(f, "add formation {reaction}"),
            Self::SetKeff { reaction, keff } => write!(f, "set keff of {reaction} to {keff}"),
            Self::AddDemand { reaction, .. } => write!(f, "add demand {reaction}"),
        }
    }
}

impl Patch {
    /// The patch that closes a gap
    #[must_use]
    pub fn for_gap(gap: &Gap, model: &MEModel, options: &TroubleshootOptions) -> Self {
        match gap.kind {
            GapKind::BlockedProducer => Self::RelaxBound {
                reaction: gap.target.clone(),
                upper_bound: options.flux_bound,
            },
            GapKind::UnproducedMetabolite => Self::AddSink {
                reaction: format!("SK_{}", gap.target),
                species: gap.target.clone(),
            },
            GapKind::MissingComplexFormation => Self::AddFormation {
                reaction: format!("formation_{}_generic", gap.target),
                complex: gap.target.clone(),
            },
            GapKind::MissingKeff => Self::SetKeff {
                reaction: gap.target.clone(),
                keff: median(model.metabolic_keffs()).unwrap_or(options.default_keff),
            },
            GapKind::UnconsumedMetabolite => Self::AddDemand {
                reaction: format!("DM_{}", gap.target),
                species: gap.target.clone(),
            },
        }
    }

    /// Apply the patch; returns false if it changed nothing
    pub fn apply(&self, model: &mut MEModel, flux_bound: f64) -> bool {
        match self {
            Self::RelaxBound {
                reaction,
                upper_bound,
            } => match model.reaction_mut(reaction) {
                Some(r) => {
                    r.upper_bound = r.upper_bound.max(*upper_bound);
                    r.flags.insert(ReactionFlag::Patched);
                    true
                }
                None => false,
            },
            Self::AddSink { reaction, species } => model.add_reaction(
                ReactionDraft::new(reaction, ReactionKind::Sink, 0.0)
                    .with_bounds(-flux_bound, 0.0)
                    .with_stoichiometry(BTreeMap::from([(species.clone(), -1.0)]))
                    .with_flag(ReactionFlag::Patched),
            ),
            Self::AddFormation { reaction, complex } => {
                model.add_species(DUMMY_COMPLEX, SpeciesKind::Complex);
                model.add_reaction(
                    ReactionDraft::new(reaction, ReactionKind::Formation, flux_bound)
                        .with_stoichiometry(BTreeMap::from([
                            (DUMMY_COMPLEX.to_string(), -1.0),
                            (complex.clone(), 1.0),
                        ]))
                        .with_flag(ReactionFlag::Patched),
                )
            }
            Self::SetKeff { reaction, keff } => match model.reaction_mut(reaction) {
                Some(r) if r.keff.is_none() => {
                    r.keff = Some(*keff);
                    r.flags.insert(ReactionFlag::Patched);
                    true
                }
                _ => false,
            },
            Self::AddDemand { reaction, species } => model.add_reaction(
                ReactionDraft::new(reaction, ReactionKind::Demand, flux_bound)
                    .with_stoichiometry(BTreeMap::from([(species.clone(), -1.0)]))
                    .with_flag(ReactionFlag::Patched),
            ),
        }
    }

    fn importance(&self) -> Importance {
        match self {
            Self::RelaxBound { .. } | Self::AddSink { .. } | Self::AddFormation { .. } => {
                Importance::High
            }
            Self::SetKeff { .. } | Self::AddDemand { .. } => Importance::Medium,
        }
    }

    fn to_do(&self) -> &'static str {
        match self {
            Self::RelaxBound { .. } => "check why the reaction was bounded to zero",
            Self::AddSink { .. } => "curate a pathway producing the species",
            Self::AddFormation { .. } => "curate complex_stoichiometry for the complex",
            Self::SetKeff { .. } => "curate reaction_keff for the reaction",
            Self::AddDemand { .. } => "curate a reaction consuming the species",
        }
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    values.retain(|v| v.is_finite() && *v > 0.0);
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TroubleshootOptions {
    pub growth_probe: f64,
    pub max_iterations: usize,
    pub default_keff: f64,
    pub flux_bound: f64,
}

impl Default for TroubleshootOptions {
    fn default() -> Self {
        Self {
            growth_probe: DEFAULT_GROWTH_PROBE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            default_keff: DEFAULT_KEFF,
            flux_bound: DEFAULT_FLUX_BOUND,
        }
    }
}

impl TroubleshootOptions {
    fn problem_options(&self) -> ProblemOptions {
        ProblemOptions {
            growth_probe: self.growth_probe,
            flux_bound: self.flux_bound,
            fallback_keff: self.default_keff,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TroubleshootOutcome {
    /// `Done` or `Unresolved`
    pub state: TroubleshootState,
    pub feasible: bool,
    /// Patches applied during this run
    pub iterations: usize,
    /// Gaps present when the loop stopped; empty when feasible
    pub remaining: Vec<Gap>,
}

/// Drives a draft model to growth feasibility by solve, diagnose, patch
pub struct FeasibilityTroubleshooter<'a> {
    solver: &'a dyn LpSolver,
    options: TroubleshootOptions,
}

impl<'a> FeasibilityTroubleshooter<'a> {
    pub fn new(solver: &'a dyn LpSolver, options: TroubleshootOptions) -> Self {
        Self { solver, options }
    }

    fn is_feasible(&self, model: &MEModel) -> Result<bool, SolverError> {
        let problem = LpProblem::from_model(model, &self.options.problem_options())?;
        let solution = self.solver.solve(&problem)?;
        debug!(
            solver = self.solver.name(),
            variables = problem.variables.len(),
            rows = problem.constraints.len(),
            iterations = solution.iterations,
            feasible = solution.is_feasible(),
            "Solved feasibility problem"
        );
        Ok(solution.is_feasible())
    }

    /// Run the loop until the model solves feasible, no untried gap remains,
    /// or the iteration cap is reached.
    ///
    /// One patch is applied per iteration and each gap is patched at most
    /// once. Every patch is recorded in the report with the outcome of the
    /// solve that follows it.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if the backend fails.
    pub fn run(
        &self,
        model: &mut MEModel,
        report: &mut TroubleshootingReport,
    ) -> Result<TroubleshootOutcome, SolverError> {
        let mut state = TroubleshootState::Draft;
        let mut iterations = 0usize;
        let mut attempted: HashSet<Gap> = HashSet::new();
        let mut pending: Option<(Gap, Patch)> = None;
        let mut next_gap: Option<Gap> = None;

        loop {
            debug!(state = %state, iterations, "Troubleshooting");
            state = match state {
                TroubleshootState::Draft => TroubleshootState::Solving,
                TroubleshootState::Solving => {
                    let feasible = self.is_feasible(model)?;
                    if let Some((gap, patch)) = pending.take() {
                        report.push_record(PatchRecord {
                            iteration: iterations,
                            gap,
                            patch,
                            feasible,
                        });
                    }
                    if feasible {
                        TroubleshootState::Feasible
                    } else {
                        TroubleshootState::Infeasible
                    }
                }
                TroubleshootState::Feasible => TroubleshootState::Done,
                TroubleshootState::Infeasible => {
                    if iterations >= self.options.max_iterations {
                        warn!(
                            cap = self.options.max_iterations,
                            "Troubleshooting iteration cap reached"
                        );
                        TroubleshootState::Unresolved
                    } else {
                        TroubleshootState::Diagnosing
                    }
                }
                TroubleshootState::Diagnosing => {
                    next_gap = diagnose(model, self.options.default_keff)
                        .into_iter()
                        .find(|gap| !attempted.contains(gap));
                    match &next_gap {
                        Some(gap) => {
                            debug!(gap = %gap, "Selected gap");
                            TroubleshootState::Patching
                        }
                        None => {
                            warn!("No patchable gap left");
                            TroubleshootState::Unresolved
                        }
                    }
                }
                TroubleshootState::Patching => {
                    let Some(gap) = next_gap.take() else {
                        return Err(SolverError::Numerical(
                            "patching without a diagnosed gap".to_string(),
                        ));
                    };
                    let patch = Patch::for_gap(&gap, model, &self.options);
                    iterations += 1;
                    if !patch.apply(model, self.options.flux_bound) {
                        warn!(patch = %patch, "Patch left the model unchanged");
                    }
                    info!(iteration = iterations, gap = %gap, patch = %patch, "Applied patch");
                    report.note(
                        patch.importance(),
                        gap.target.clone(),
                        format!("iteration {iterations}: {gap}; {patch}"),
                        patch.to_do(),
                    );
                    attempted.insert(gap.clone());
                    pending = Some((gap, patch));
                    TroubleshootState::Solving
                }
                TroubleshootState::Done | TroubleshootState::Unresolved => break,
            };
        }

        let remaining = if state == TroubleshootState::Unresolved {
            diagnose(model, self.options.default_keff)
        } else {
            Vec::new()
        };
        if state == TroubleshootState::Unresolved {
            report.note(
                Importance::Critical,
                "troubleshooting",
                format!(
                    "model still infeasible after {iterations} iterations with {} open gaps",
                    remaining.len()
                ),
                "inspect the unresolved gaps and curate the missing machinery",
            );
        }
        report.finish(state, remaining.clone());

        Ok(TroubleshootOutcome {
            state,
            feasible: state == TroubleshootState::Done,
            iterations,
            remaining,
        })
    }
}
