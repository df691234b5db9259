// Branch-and-bound MIP engine with pluggable branching rules and node
// selectors.
//
// Typical use: build or read a problem into a `Model`, include plugins,
// set parameters and call `Model::solve`. See demos/ for complete programs.

// Domain layer: problem model, transformation, LP interface
pub mod domain;

// Branching and node-selection protocol plus the built-in plugins
pub mod plugins;

// Branch-and-bound search
pub mod search;

// Application layer: parameters and the Model façade
pub mod application;

// Infrastructure layer: MPS reader, logging setup
pub mod infrastructure;

// LP relaxation adapters: concrete implementations of RelaxationSolver
pub mod solver;

// Re-export commonly used types
pub use domain::{
    Constraint, ConstraintType, Error, ObjectiveFunction, OptimizationProblem, OptimizationType,
    Result, Solution, SolutionStatus, SolverStatistics, Variable, VariableType,
};

pub use application::{Model, ParamValue, Params, Stage};

pub use plugins::{
    BranchContext, BranchResult, BranchRule, BranchRuleProperties, NodeSelector,
    NodeSelectorProperties, Selection, SolveInfo,
};

pub use search::{Node, NodeId, OpenNodes};

pub use solver::RelaxationFactory;
#[cfg(feature = "highs")]
pub use solver::HighsRelaxation;
#[cfg(feature = "cbc")]
pub use solver::CoinCbcRelaxation;
