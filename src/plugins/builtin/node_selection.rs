// Built-in node selectors.

use std::cmp::Ordering;

use crate::domain::Result;
use crate::plugins::{NodeSelector, NodeSelectorProperties, Selection, SolveInfo};
use crate::search::{Node, OpenNodes};

/// Best-estimate search with plunging.
///
/// While plunging it follows the priority child (then the priority sibling)
/// of the last node; after `max_plunge_depth` consecutive plunge steps, or
/// when there is nothing to plunge into, it falls back to the open node with
/// the best estimate.
#[derive(Debug, Clone)]
pub struct BestEstimateSelector {
    max_plunge_depth: usize,
    plunge_depth: usize,
}

impl BestEstimateSelector {
    pub const NAME: &'static str = "estimate";

    pub fn new() -> Self {
        Self::with_max_plunge_depth(10)
    }

    pub fn with_max_plunge_depth(max_plunge_depth: usize) -> Self {
        Self {
            max_plunge_depth,
            plunge_depth: 0,
        }
    }

    pub fn properties() -> NodeSelectorProperties {
        NodeSelectorProperties::new(Self::NAME, "best estimate search")
            .with_priorities(200_000, 100)
    }
}

impl Default for BestEstimateSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeSelector for BestEstimateSelector {
    fn compare(&self, a: &Node, b: &Node) -> Ordering {
        a.estimate()
            .total_cmp(&b.estimate())
            .then_with(|| a.lower_bound().total_cmp(&b.lower_bound()))
    }

    fn select(&mut self, open: &OpenNodes<'_>) -> Result<Selection> {
        if self.plunge_depth < self.max_plunge_depth {
            if let Some(node) = open.priority_child().or_else(|| open.priority_sibling()) {
                self.plunge_depth += 1;
                return Ok(Selection::Node(node.id()));
            }
        }
        self.plunge_depth = 0;
        Ok(open.best_node(|a, b| self.compare(a, b)).into())
    }

    fn init_solve(&mut self, _info: &SolveInfo<'_>) -> Result<()> {
        self.plunge_depth = 0;
        Ok(())
    }
}

/// Best-bound search: always the open node with the smallest lower bound.
#[derive(Debug, Default, Clone)]
pub struct BestBoundSelector;

impl BestBoundSelector {
    pub const NAME: &'static str = "bfs";

    pub fn properties() -> NodeSelectorProperties {
        NodeSelectorProperties::new(Self::NAME, "best bound search").with_priorities(100_000, 0)
    }
}

impl NodeSelector for BestBoundSelector {
    fn compare(&self, a: &Node, b: &Node) -> Ordering {
        a.lower_bound()
            .total_cmp(&b.lower_bound())
            .then_with(|| a.estimate().total_cmp(&b.estimate()))
    }
}

/// Depth-first search.
///
/// Dives into the priority child, then the priority sibling, and backtracks
/// to the deepest leaf when both are exhausted.
#[derive(Debug, Default, Clone)]
pub struct DepthFirstSelector;

impl DepthFirstSelector {
    pub const NAME: &'static str = "dfs";

    pub fn properties() -> NodeSelectorProperties {
        NodeSelectorProperties::new(Self::NAME, "depth first search").with_priorities(0, 100_000)
    }
}

impl NodeSelector for DepthFirstSelector {
    fn compare(&self, a: &Node, b: &Node) -> Ordering {
        b.depth()
            .cmp(&a.depth())
            .then_with(|| a.lower_bound().total_cmp(&b.lower_bound()))
    }

    fn select(&mut self, open: &OpenNodes<'_>) -> Result<Selection> {
        let node = open
            .priority_child()
            .or_else(|| open.priority_sibling())
            .or_else(|| open.best_leaf(|a, b| self.compare(a, b)));
        Ok(node.into())
    }
}

/// Breadth-first search: shallowest nodes first, in creation order.
#[derive(Debug, Default, Clone)]
pub struct BreadthFirstSelector;

impl BreadthFirstSelector {
    pub const NAME: &'static str = "breadthfirst";

    pub fn properties() -> NodeSelectorProperties {
        NodeSelectorProperties::new(Self::NAME, "breadth first search")
            .with_priorities(-10_000, -10_000)
    }
}

impl NodeSelector for BreadthFirstSelector {
    fn compare(&self, a: &Node, b: &Node) -> Ordering {
        a.depth().cmp(&b.depth()).then_with(|| a.id().cmp(&b.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BoundChange;
    use crate::search::Tree;

    /// Root branched into 1 (lb 4, prio 0.2) and 2 (lb 3, prio 0.8);
    /// node 2 processed and branched into 3 (lb 5, prio 0.6) and 4 (lb 6, prio 0.4).
    fn tree() -> Tree {
        let mut tree = Tree::with_root(Node::root());
        let (root, _) = tree.focus(0).unwrap();
        let a = tree.allocate_id();
        let b = tree.allocate_id();
        tree.add_child(root.child(a, BoundChange::down(0, 0.5), 4.0, 4.0, 0.2));
        tree.add_child(root.child(b, BoundChange::up(0, 0.5), 3.0, 9.0, 0.8));
        let (n2, _) = tree.focus(b).unwrap();
        let c = tree.allocate_id();
        let d = tree.allocate_id();
        tree.add_child(n2.child(c, BoundChange::down(1, 0.5), 5.0, 5.0, 0.6));
        tree.add_child(n2.child(d, BoundChange::up(1, 0.5), 6.0, 6.0, 0.4));
        tree
    }

    #[test]
    fn test_depth_first_follows_priority_child() {
        let tree = tree();
        let mut sel = DepthFirstSelector;
        assert_eq!(sel.select(&tree.open_nodes()).unwrap(), Selection::Node(3));
    }

    #[test]
    fn test_depth_first_backtracks_to_deepest_leaf() {
        let mut tree = tree();
        tree.focus(1).unwrap();
        // Leaf 1 selected: 3 and 4 are now leaves, nothing else open.
        let mut sel = DepthFirstSelector;
        assert_eq!(sel.select(&tree.open_nodes()).unwrap(), Selection::Node(3));
    }

    #[test]
    fn test_depth_first_moves_to_priority_sibling() {
        let mut tree = tree();
        // Child 3 processed without branching: 4 is its sibling, 1 a leaf.
        tree.focus(3).unwrap();
        let mut sel = DepthFirstSelector;
        assert_eq!(sel.select(&tree.open_nodes()).unwrap(), Selection::Node(4));
    }

    #[test]
    fn test_best_bound() {
        let tree = tree();
        let mut sel = BestBoundSelector;
        assert_eq!(sel.select(&tree.open_nodes()).unwrap(), Selection::Node(1));
    }

    #[test]
    fn test_breadth_first() {
        let tree = tree();
        let mut sel = BreadthFirstSelector;
        assert_eq!(sel.select(&tree.open_nodes()).unwrap(), Selection::Node(1));
    }

    #[test]
    fn test_best_estimate_plunges_then_falls_back() {
        let tree = tree();
        let mut sel = BestEstimateSelector::with_max_plunge_depth(1);
        assert_eq!(sel.select(&tree.open_nodes()).unwrap(), Selection::Node(3));
        // Plunge budget used up: best estimate overall is node 1 (4.0).
        assert_eq!(sel.select(&tree.open_nodes()).unwrap(), Selection::Node(1));
    }

    #[test]
    fn test_best_estimate_plunges_into_sibling() {
        let mut tree = tree();
        tree.focus(3).unwrap();
        let mut sel = BestEstimateSelector::new();
        // Node 1 has the better estimate, but the plunge continues at sibling 4.
        assert_eq!(sel.select(&tree.open_nodes()).unwrap(), Selection::Node(4));
    }

    #[test]
    fn test_empty_open_set_stops() {
        let leaves: Vec<Node> = Vec::new();
        let open = OpenNodes::new(&[], &[], &leaves);
        assert_eq!(DepthFirstSelector.select(&open).unwrap(), Selection::Stop);
        assert_eq!(BestBoundSelector.select(&open).unwrap(), Selection::Stop);
    }
}
