//! Steady-state feasibility through the Clarabel interior-point solver.
//!
//! The problem is posed with a zero objective in Clarabel's standard form
//! `A x + s = b` with `s` in a product cone. Mass balances and pinned fluxes
//! are zero-cone rows. Each finite flux bound is one non-negative-cone row.

use ::clarabel::algebra::CscMatrix;
use ::clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use tracing::trace;

use crate::troubleshoot::problem::{LpProblem, LpSolution, LpSolver, LpStatus, SolverError};

/// Default interior-point iteration budget
pub const DEFAULT_MAX_ITER: u32 = 200;

/// Default primal feasibility tolerance
pub const DEFAULT_TOL_FEAS: f64 = 1e-8;

/// Bounds closer than this pin the flux
const FIXED_TOL: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct ClarabelSolver {
    max_iter: u32,
    tol_feas: f64,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_MAX_ITER,
            tol_feas: DEFAULT_TOL_FEAS,
        }
    }
}

impl ClarabelSolver {
    pub const NAME: &'static str = "clarabel";

    #[must_use]
    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    #[must_use]
    pub fn with_tol_feas(mut self, tol_feas: f64) -> Self {
        self.tol_feas = tol_feas;
        self
    }
}

/// One row `sum(coefficient * x) + s = rhs`
type Row = (Vec<(usize, f64)>, f64);

/// The standard-form rows of a problem, grouped by cone
#[derive(Debug, Default)]
struct StandardForm {
    zero: Vec<Row>,
    nonnegative: Vec<Row>,
}

impl StandardForm {
    /// `None` when a variable has an empty bound range
    fn from_problem(problem: &LpProblem) -> Option<Self> {
        let mut form = Self::default();
        for constraint in &problem.constraints {
            form.zero
                .push((constraint.coefficients.clone(), constraint.rhs));
        }
        for (j, variable) in problem.variables.iter().enumerate() {
            if variable.lower > variable.upper + FIXED_TOL {
                return None;
            }
            if variable.lower.is_finite() && (variable.upper - variable.lower).abs() <= FIXED_TOL {
                form.zero.push((vec![(j, 1.0)], variable.lower));
                continue;
            }
            if variable.upper.is_finite() {
                form.nonnegative.push((vec![(j, 1.0)], variable.upper));
            }
            if variable.lower.is_finite() {
                form.nonnegative.push((vec![(j, -1.0)], -variable.lower));
            }
        }
        Some(form)
    }

    fn len(&self) -> usize {
        self.zero.len() + self.nonnegative.len()
    }

    fn cones(&self) -> Vec<SupportedConeT<f64>> {
        let mut cones = Vec::with_capacity(2);
        if !self.zero.is_empty() {
            cones.push(SupportedConeT::ZeroConeT(self.zero.len()));
        }
        if !self.nonnegative.is_empty() {
            cones.push(SupportedConeT::NonnegativeConeT(self.nonnegative.len()));
        }
        cones
    }

    /// Column-compressed `A` with `n` columns, and the right-hand side `b`
    fn matrix(&self, n: usize) -> (CscMatrix<f64>, Vec<f64>) {
        let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut rhs = Vec::with_capacity(self.len());
        for (row, (coefficients, value)) in self.zero.iter().chain(&self.nonnegative).enumerate() {
            rhs.push(*value);
            for &(j, a) in coefficients {
                if a == 0.0 {
                    continue;
                }
                // Rows arrive in order, so a repeated variable is always the last entry
                match columns[j].last_mut() {
                    Some((last, total)) if *last == row => *total += a,
                    _ => columns[j].push((row, a)),
                }
            }
        }

        let mut colptr = Vec::with_capacity(n + 1);
        let mut rowval = Vec::new();
        let mut nzval = Vec::new();
        colptr.push(0);
        for column in columns {
            for (row, a) in column {
                rowval.push(row);
                nzval.push(a);
            }
            colptr.push(rowval.len());
        }
        (CscMatrix::new(rhs.len(), n, colptr, rowval, nzval), rhs)
    }
}

fn infeasible(iterations: usize) -> LpSolution {
    LpSolution {
        status: LpStatus::Infeasible,
        values: Vec::new(),
        iterations,
    }
}

impl LpSolver for ClarabelSolver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn solve(&self, problem: &LpProblem) -> Result<LpSolution, SolverError> {
        let n = problem.variables.len();
        let Some(form) = StandardForm::from_problem(problem) else {
            return Ok(infeasible(0));
        };
        if form.len() == 0 {
            return Ok(LpSolution {
                status: LpStatus::Feasible,
                values: vec![0.0; n],
                iterations: 0,
            });
        }

        let (a, b) = form.matrix(n);
        let p = CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());
        let q = vec![0.0; n];
        let cones = form.cones();

        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .max_iter(self.max_iter)
            .tol_feas(self.tol_feas)
            .build()
            .map_err(|e| SolverError::Numerical(e.to_string()))?;

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let iterations = usize::try_from(solver.solution.iterations).unwrap_or(usize::MAX);
        trace!(
            variables = n,
            rows = b.len(),
            iterations,
            status = ?solver.solution.status,
            "Clarabel finished"
        );
        match solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => Ok(LpSolution {
                status: LpStatus::Feasible,
                values: solver.solution.x.clone(),
                iterations,
            }),
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                Ok(infeasible(iterations))
            }
            SolverStatus::MaxIterations => Err(SolverError::IterationLimit(iterations)),
            other => Err(SolverError::Numerical(format!("solver stopped with status {other:?}"))),
        }
    }
}
