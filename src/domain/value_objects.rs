// Domain value objects representing core optimization concepts

use std::fmt;

/// Type of decision variable in the optimization problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// Continuous real number (x ∈ ℝ)
    Continuous,
    /// Integer number (x ∈ ℤ)
    Integer,
    /// Binary variable (x ∈ {0, 1})
    Binary,
}

impl VariableType {
    pub fn is_integral(self) -> bool {
        matches!(self, VariableType::Integer | VariableType::Binary)
    }
}

/// Type of constraint comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    /// Less than or equal (≤)
    LessThanOrEqual,
    /// Equal (=)
    Equal,
    /// Greater than or equal (≥)
    GreaterThanOrEqual,
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationType {
    /// Minimize the objective function
    Minimize,
    /// Maximize the objective function
    Maximize,
}

/// Status of the optimization solution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Search tree exhausted with an incumbent
    Optimal,
    /// Search tree exhausted without any feasible solution
    Infeasible,
    /// Root relaxation is unbounded
    Unbounded,
    /// LP backend could not tell infeasibility and unboundedness apart
    InfeasibleOrUnbounded,
    /// Time limit reached
    TimeLimit,
    /// Node limit reached
    NodeLimit,
    /// Relative gap dropped below `limits/gap`
    GapLimit,
    /// A node selector asked the search to stop
    Interrupted,
}

impl SolutionStatus {
    /// True when the search stopped because of a limit or an interrupt,
    /// i.e. optimality was not proven.
    pub fn is_limit(self) -> bool {
        matches!(
            self,
            SolutionStatus::TimeLimit
                | SolutionStatus::NodeLimit
                | SolutionStatus::GapLimit
                | SolutionStatus::Interrupted
        )
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
            SolutionStatus::InfeasibleOrUnbounded => write!(f, "Infeasible or Unbounded"),
            SolutionStatus::TimeLimit => write!(f, "Time Limit Reached"),
            SolutionStatus::NodeLimit => write!(f, "Node Limit Reached"),
            SolutionStatus::GapLimit => write!(f, "Gap Limit Reached"),
            SolutionStatus::Interrupted => write!(f, "Interrupted"),
        }
    }
}

/// LP engine used to solve node relaxations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxationBackend {
    /// HiGHS dual simplex
    Highs,
    /// COIN-OR CBC (through good_lp)
    CoinCbc,
}

impl RelaxationBackend {
    /// Parse the value of the `lp/solver` parameter.
    pub fn from_param(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "highs" => Some(RelaxationBackend::Highs),
            "cbc" | "coin_cbc" | "coin-cbc" => Some(RelaxationBackend::CoinCbc),
            _ => None,
        }
    }
}

impl fmt::Display for RelaxationBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelaxationBackend::Highs => write!(f, "HiGHS"),
            RelaxationBackend::CoinCbc => write!(f, "COIN-OR CBC"),
        }
    }
}
