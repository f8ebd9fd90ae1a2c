use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::model::MEModel;
use crate::troubleshoot::clarabel::ClarabelSolver;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Unknown solver backend '{0}' (available: {available})", available = available_solvers().join(", "))]
    UnknownBackend(String),

    #[error("Solver gave up after {0} iterations")]
    IterationLimit(usize),

    #[error("Problem has no growth reaction")]
    NoGrowthReaction,

    #[error("Numerical failure: {0}")]
    Numerical(String),
}

/// A flux variable with its bounds; infinite bounds are unbounded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LpVariable {
    pub id: String,
    pub lower: f64,
    pub upper: f64,
}

/// One steady-state mass balance: `sum(coefficient * flux) = rhs`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LpConstraint {
    pub id: String,
    /// Variable index -> coefficient
    pub coefficients: Vec<(usize, f64)>,
    pub rhs: f64,
}

/// A linear feasibility problem over reaction fluxes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LpProblem {
    pub variables: Vec<LpVariable>,
    pub constraints: Vec<LpConstraint>,
    /// Index of the growth variable
    pub objective: usize,
}

/// Options for turning a model into an LP
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProblemOptions {
    /// Flux the growth reaction is fixed at
    pub growth_probe: f64,
    /// Bounds at or beyond this magnitude are unbounded
    pub flux_bound: f64,
    /// keff used to couple catalysts of reactions whose keff is unset
    pub fallback_keff: f64,
}

impl LpProblem {
    /// Build the steady-state feasibility problem for a model.
    ///
    /// Every reaction is a variable and every species a mass balance row.
    /// The growth reaction is pinned at the probe value. A catalysed reaction
    /// without a keff is pinned at zero.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::NoGrowthReaction` if the model has no growth
    /// reaction or it is missing from the reaction index.
    pub fn from_model(model: &MEModel, options: &ProblemOptions) -> Result<Self, SolverError> {
        let growth_id = model
            .growth_reaction
            .as_deref()
            .ok_or(SolverError::NoGrowthReaction)?;
        let objective = model
            .reactions
            .get_index_of(growth_id)
            .ok_or(SolverError::NoGrowthReaction)?;

        let unbounded = |value: f64| {
            if value >= options.flux_bound {
                f64::INFINITY
            } else if value <= -options.flux_bound {
                f64::NEG_INFINITY
            } else {
                value
            }
        };

        let mut variables = Vec::with_capacity(model.reactions.len());
        let mut rows: HashMap<&str, Vec<(usize, f64)>> = HashMap::new();

        for (index, reaction) in model.reactions.values().enumerate() {
            let (lower, upper) = if index == objective {
                (options.growth_probe, options.growth_probe)
            } else if reaction.needs_keff() && reaction.keff.is_none() {
                (0.0, 0.0)
            } else {
                (unbounded(reaction.lower_bound), unbounded(reaction.upper_bound))
            };
            variables.push(LpVariable {
                id: reaction.id.clone(),
                lower,
                upper,
            });

            for (species, coefficient) in model.coupled_stoichiometry(reaction, options.fallback_keff) {
                let Some((_, key, _)) = model.species.get_full(species.as_str()) else {
                    continue;
                };
                rows.entry(key.as_str()).or_default().push((index, coefficient));
            }
        }

        // Rows follow species index order
        let mut constraints: Vec<LpConstraint> = Vec::with_capacity(rows.len());
        for species in model.species.keys() {
            if let Some(coefficients) = rows.remove(species.as_str()) {
                constraints.push(LpConstraint {
                    id: species.clone(),
                    coefficients,
                    rhs: 0.0,
                });
            }
        }

        Ok(Self {
            variables,
            constraints,
            objective,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LpStatus {
    Feasible,
    Infeasible,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LpSolution {
    pub status: LpStatus,
    /// Flux per variable; empty when infeasible
    pub values: Vec<f64>,
    pub iterations: usize,
}

impl LpSolution {
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.status == LpStatus::Feasible
    }
}

/// A linear programming backend
pub trait LpSolver: Send + Sync {
    fn name(&self) -> &str;

    /// Decide feasibility of the problem
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if the backend fails to reach a verdict.
    fn solve(&self, problem: &LpProblem) -> Result<LpSolution, SolverError>;
}

/// Names accepted by [`solver_by_name`]
#[must_use]
pub fn available_solvers() -> Vec<&'static str> {
    vec![ClarabelSolver::NAME]
}

/// Resolve a configured backend name
///
/// # Errors
///
/// Returns `SolverError::UnknownBackend` for an unrecognised name.
pub fn solver_by_name(name: &str) -> Result<Box<dyn LpSolver>, SolverError> {
    match name.to_ascii_lowercase().as_str() {
        ClarabelSolver::NAME => Ok(Box::new(ClarabelSolver::default())),
        _ => Err(SolverError::UnknownBackend(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{ReactionDraft, ReactionKind};
    use crate::core::types::SpeciesKind;
    use std::collections::BTreeMap;

    const OPTIONS: ProblemOptions = ProblemOptions {
        growth_probe: 0.001,
        flux_bound: 1000.0,
        fallback_keff: 65.0,
    };

    fn model() -> MEModel {
        let mut model = MEModel::new("toy");
        model.add_species("a_c", SpeciesKind::Metabolite);
        model.add_species("ENZ", SpeciesKind::Complex);
        model.add_reaction(
            ReactionDraft::new("EX_a_c", ReactionKind::Exchange, 1000.0)
                .with_bounds(-1000.0, 1000.0)
                .with_stoichiometry(BTreeMap::from([("a_c".to_string(), -1.0)])),
        );
        model.add_reaction(
            ReactionDraft::new("R1", ReactionKind::Metabolic, 500.0)
                .with_stoichiometry(BTreeMap::from([("a_c".to_string(), -1.0)]))
                .with_catalyst("ENZ"),
        );
        model.add_reaction(
            ReactionDraft::new("BIOMASS", ReactionKind::Growth, 1000.0)
                .with_stoichiometry(BTreeMap::from([("a_c".to_string(), -1.0)])),
        );
        model.growth_reaction = Some("BIOMASS".to_string());
        model
    }

    #[test]
    fn test_from_model_bounds() {
        let problem = LpProblem::from_model(&model(), &OPTIONS).unwrap();
        assert_eq!(problem.variables.len(), 3);

        let exchange = &problem.variables[0];
        assert!(exchange.lower.is_infinite() && exchange.lower < 0.0);
        assert!(exchange.upper.is_infinite());

        // Catalysed without keff
        assert_eq!((problem.variables[1].lower, problem.variables[1].upper), (0.0, 0.0));

        assert_eq!(problem.objective, 2);
        assert!((problem.variables[2].lower - 0.001).abs() < 1e-15);
        assert!((problem.variables[2].upper - 0.001).abs() < 1e-15);
    }

    #[test]
    fn test_from_model_rows() {
        let problem = LpProblem::from_model(&model(), &OPTIONS).unwrap();
        let ids: Vec<&str> = problem.constraints.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a_c", "ENZ"]);
        assert_eq!(problem.constraints[0].coefficients.len(), 3);
        let (index, coefficient) = problem.constraints[1].coefficients[0];
        assert_eq!(index, 1);
        assert!((coefficient + 1.0 / 65.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_model_requires_growth() {
        let mut model = model();
        model.growth_reaction = None;
        assert_eq!(
            LpProblem::from_model(&model, &OPTIONS),
            Err(SolverError::NoGrowthReaction)
        );
    }

    #[test]
    fn test_solver_by_name() {
        assert_eq!(solver_by_name("clarabel").unwrap().name(), "clarabel");
        assert_eq!(solver_by_name("Clarabel").unwrap().name(), "clarabel");
        assert!(matches!(
            solver_by_name("gurobi"),
            Err(SolverError::UnknownBackend(_))
        ));
    }
}
