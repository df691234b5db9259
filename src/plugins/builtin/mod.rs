// Built-in plugins.
//
// | Plugin         | Kind           | Priority (standard / memsave) | Max depth | Max bound distance |
// |----------------|----------------|-------------------------------|-----------|--------------------|
// | `mostinf`      | branching      | -1000                         | unlimited | 1.0                |
// | `leastinf`     | branching      | -50                           | unlimited | 1.0                |
// | `random`       | branching      | -100000                       | unlimited | 1.0                |
// | `estimate`     | node selection | 200000 / 100                  |           |                    |
// | `bfs`          | node selection | 100000 / 0                    |           |                    |
// | `dfs`          | node selection | 0 / 100000                    |           |                    |
// | `breadthfirst` | node selection | -10000 / -10000               |           |                    |

mod branching;
mod node_selection;

pub use branching::{LeastInfeasibleBranching, MostInfeasibleBranching, RandomBranching};
pub use node_selection::{
    BestBoundSelector, BestEstimateSelector, BreadthFirstSelector, DepthFirstSelector,
};

use super::{BranchRule, BranchRuleProperties, NodeSelector, NodeSelectorProperties};

/// Plugins registered by `Model::include_default_plugins`.
pub const DEFAULTS: [&str; 3] = [
    MostInfeasibleBranching::NAME,
    BestEstimateSelector::NAME,
    DepthFirstSelector::NAME,
];

/// Names of all built-in branching rules.
pub const BRANCH_RULES: [&str; 3] = [
    MostInfeasibleBranching::NAME,
    LeastInfeasibleBranching::NAME,
    RandomBranching::NAME,
];

/// Names of all built-in node selectors.
pub const NODE_SELECTORS: [&str; 4] = [
    BestEstimateSelector::NAME,
    BestBoundSelector::NAME,
    DepthFirstSelector::NAME,
    BreadthFirstSelector::NAME,
];

/// Instantiate a built-in branching rule by name.
pub fn branch_rule(name: &str) -> Option<(BranchRuleProperties, Box<dyn BranchRule>)> {
    match name {
        MostInfeasibleBranching::NAME => Some((
            MostInfeasibleBranching::properties(),
            Box::new(MostInfeasibleBranching),
        )),
        LeastInfeasibleBranching::NAME => Some((
            LeastInfeasibleBranching::properties(),
            Box::new(LeastInfeasibleBranching),
        )),
        RandomBranching::NAME => Some((RandomBranching::properties(), Box::new(RandomBranching::new()))),
        _ => None,
    }
}

/// Instantiate a built-in node selector by name.
pub fn node_selector(name: &str) -> Option<(NodeSelectorProperties, Box<dyn NodeSelector>)> {
    match name {
        BestEstimateSelector::NAME => Some((
            BestEstimateSelector::properties(),
            Box::new(BestEstimateSelector::new()),
        )),
        BestBoundSelector::NAME => Some((BestBoundSelector::properties(), Box::new(BestBoundSelector))),
        DepthFirstSelector::NAME => {
            Some((DepthFirstSelector::properties(), Box::new(DepthFirstSelector)))
        }
        BreadthFirstSelector::NAME => Some((
            BreadthFirstSelector::properties(),
            Box::new(BreadthFirstSelector),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_is_constructible() {
        for name in BRANCH_RULES {
            let (props, _) = branch_rule(name).unwrap();
            assert_eq!(props.name, name);
        }
        for name in NODE_SELECTORS {
            let (props, _) = node_selector(name).unwrap();
            assert_eq!(props.name, name);
        }
        assert!(branch_rule("pscost").is_none());
    }
}
