// Domain service interface for solving node LP relaxations
// Defines the contract that any LP backend must follow, so the search never
// depends on a concrete LP library.

use super::error::Result;
use super::transform::{Domain, TransformedProblem};

/// Outcome of one LP solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxationStatus {
    Optimal,
    Infeasible,
    Unbounded,
    InfeasibleOrUnbounded,
}

/// LP relaxation result, in the minimization form of the transformed problem
#[derive(Debug, Clone)]
pub struct Relaxation {
    pub status: RelaxationStatus,
    pub x: Vec<f64>,
    /// Objective value including the offset. `+inf` unless optimal.
    pub objective: f64,
}

impl Relaxation {
    pub fn optimal(x: Vec<f64>, objective: f64) -> Self {
        Self {
            status: RelaxationStatus::Optimal,
            x,
            objective,
        }
    }

    pub fn without_solution(status: RelaxationStatus) -> Self {
        Self {
            status,
            x: Vec::new(),
            objective: f64::INFINITY,
        }
    }
}

/// LP engine interface
///
/// Implementations solve the continuous relaxation of `problem` with the
/// variable bounds replaced by `domain`, ignoring integrality.
pub trait RelaxationSolver {
    fn solve(&self, problem: &TransformedProblem, domain: &Domain) -> Result<Relaxation>;

    /// Get the name of this LP backend
    fn name(&self) -> &str;
}
