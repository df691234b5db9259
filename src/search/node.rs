// Search node representation.

use crate::domain::{BoundChange, Domain};

/// Node identifier, unique within one solve. The root is always `0`.
pub type NodeId = u64;

/// A node in the branch-and-bound tree.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    depth: usize,
    lower_bound: f64,
    estimate: f64,
    priority: f64,
    /// Cumulative bound changes from the root to this node.
    bound_changes: Vec<BoundChange>,
}

impl Node {
    /// Create the root node.
    pub fn root() -> Self {
        Self {
            id: 0,
            parent: None,
            depth: 0,
            lower_bound: f64::NEG_INFINITY,
            estimate: f64::NEG_INFINITY,
            priority: 0.0,
            bound_changes: Vec::new(),
        }
    }

    /// Create a child node that adds `change` to this node's path.
    ///
    /// The child inherits `lower_bound` from its parent's LP solve.
    pub fn child(
        &self,
        id: NodeId,
        change: BoundChange,
        lower_bound: f64,
        estimate: f64,
        priority: f64,
    ) -> Self {
        let mut bound_changes = Vec::with_capacity(self.bound_changes.len() + 1);
        bound_changes.extend_from_slice(&self.bound_changes);
        bound_changes.push(change);
        Self {
            id,
            parent: Some(self.id),
            depth: self.depth + 1,
            lower_bound,
            estimate,
            priority,
            bound_changes,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Lower bound on the (minimization) objective in this subtree.
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    /// Estimated objective of the best solution in this subtree.
    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    /// Preference assigned by the branching rule that created this node.
    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn bound_changes(&self) -> &[BoundChange] {
        &self.bound_changes
    }

    pub(crate) fn raise_lower_bound(&mut self, bound: f64) {
        if bound > self.lower_bound {
            self.lower_bound = bound;
        }
        if self.estimate < self.lower_bound {
            self.estimate = self.lower_bound;
        }
    }

    pub(crate) fn push_bound_change(&mut self, change: BoundChange) {
        self.bound_changes.push(change);
    }

    /// Node domain: the root domain with this node's path applied.
    pub fn domain(&self, root: &Domain) -> Domain {
        let mut domain = root.clone();
        for change in &self.bound_changes {
            domain.apply(change);
        }
        domain
    }

    /// A node can be pruned once its lower bound reaches the cutoff bound.
    pub fn can_prune(&self, cutoff: f64) -> bool {
        self.lower_bound >= cutoff - 1e-9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_node() {
        let root = Node::root();
        assert_eq!(root.id(), 0);
        assert!(root.parent().is_none());
        assert_eq!(root.depth(), 0);
        assert!(root.bound_changes().is_empty());
    }

    #[test]
    fn test_child_accumulates_path() {
        let root = Node::root();
        let child = root.child(1, BoundChange::down(0, 0.5), 3.0, 4.0, 0.5);
        let grandchild = child.child(3, BoundChange::up(2, 1.5), 3.5, 4.0, 0.5);

        assert_eq!(grandchild.parent(), Some(1));
        assert_eq!(grandchild.depth(), 2);
        assert_eq!(grandchild.bound_changes().len(), 2);

        let root_domain = Domain::new(vec![0.0; 3], vec![1.0, 1.0, 5.0]);
        let domain = grandchild.domain(&root_domain);
        assert_eq!(domain.upper(0), 0.0);
        assert_eq!(domain.lower(2), 2.0);
    }

    #[test]
    fn test_pruning() {
        let mut node = Node::root();
        node.raise_lower_bound(10.0);

        assert!(!node.can_prune(15.0));
        assert!(node.can_prune(10.0));
        assert!(node.can_prune(8.0));

        // Bounds never decrease.
        node.raise_lower_bound(2.0);
        assert_eq!(node.lower_bound(), 10.0);
        assert_eq!(node.estimate(), 10.0);
    }
}
