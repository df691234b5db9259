// Plugin protocol: branching rules and node selectors.

mod branch_rule;
pub mod builtin;
mod node_selector;
mod registry;

pub use branch_rule::{
    bound_distance, fractional_candidates, BranchCandidate, BranchContext, BranchResult,
    BranchRule, BranchRuleProperties, Branching,
};
pub use node_selector::{NodeSelector, NodeSelectorProperties, Selection};
pub use registry::PluginSet;

use crate::domain::TransformedProblem;

/// Read-only solve information passed to the lifecycle hooks.
#[derive(Debug, Clone, Copy)]
pub struct SolveInfo<'a> {
    pub problem: &'a TransformedProblem,
    /// Value of `randomization/seed`.
    pub random_seed: u64,
}
