// Open-node storage for the branch-and-bound tree.
//
// Open nodes are split into three disjoint categories relative to the node
// that was processed last (the focus node):
//
// * children: created by branching on the focus node,
// * siblings: the other children of the focus node's parent,
// * leaves: every other open node.
//
// Selecting a node moves the remaining open nodes between categories so that
// the invariant holds for the new focus node.

use std::cmp::Ordering;

use super::node::{Node, NodeId};

/// Category of an open node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    Child,
    Sibling,
    Leaf,
}

/// Read-only view of the open nodes handed to node selectors.
#[derive(Debug, Clone, Copy)]
pub struct OpenNodes<'a> {
    children: &'a [Node],
    siblings: &'a [Node],
    leaves: &'a [Node],
}

impl<'a> OpenNodes<'a> {
    pub fn new(children: &'a [Node], siblings: &'a [Node], leaves: &'a [Node]) -> Self {
        Self {
            children,
            siblings,
            leaves,
        }
    }

    pub fn children(&self) -> &'a [Node] {
        self.children
    }

    pub fn siblings(&self) -> &'a [Node] {
        self.siblings
    }

    pub fn leaves(&self) -> &'a [Node] {
        self.leaves
    }

    pub fn len(&self) -> usize {
        self.children.len() + self.siblings.len() + self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All open nodes: children, then siblings, then leaves.
    pub fn iter(&self) -> impl Iterator<Item = &'a Node> + 'a {
        self.children
            .iter()
            .chain(self.siblings.iter())
            .chain(self.leaves.iter())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.iter().any(|n| n.id() == id)
    }

    pub fn category(&self, id: NodeId) -> Option<NodeCategory> {
        if self.children.iter().any(|n| n.id() == id) {
            Some(NodeCategory::Child)
        } else if self.siblings.iter().any(|n| n.id() == id) {
            Some(NodeCategory::Sibling)
        } else if self.leaves.iter().any(|n| n.id() == id) {
            Some(NodeCategory::Leaf)
        } else {
            None
        }
    }

    /// Best child according to `cmp`, where `Less` means "process first".
    pub fn best_child<F>(&self, cmp: F) -> Option<&'a Node>
    where
        F: Fn(&Node, &Node) -> Ordering,
    {
        best_by(self.children.iter(), cmp)
    }

    pub fn best_sibling<F>(&self, cmp: F) -> Option<&'a Node>
    where
        F: Fn(&Node, &Node) -> Ordering,
    {
        best_by(self.siblings.iter(), cmp)
    }

    pub fn best_leaf<F>(&self, cmp: F) -> Option<&'a Node>
    where
        F: Fn(&Node, &Node) -> Ordering,
    {
        best_by(self.leaves.iter(), cmp)
    }

    /// Best node over all three categories.
    pub fn best_node<F>(&self, cmp: F) -> Option<&'a Node>
    where
        F: Fn(&Node, &Node) -> Ordering,
    {
        best_by(self.iter(), cmp)
    }

    /// Child with the highest branching priority.
    pub fn priority_child(&self) -> Option<&'a Node> {
        highest_priority(self.children)
    }

    /// Sibling with the highest branching priority.
    pub fn priority_sibling(&self) -> Option<&'a Node> {
        highest_priority(self.siblings)
    }
}

// Ties keep the earlier node.
fn best_by<'a, I, F>(nodes: I, cmp: F) -> Option<&'a Node>
where
    I: Iterator<Item = &'a Node>,
    F: Fn(&Node, &Node) -> Ordering,
{
    nodes.fold(None, |best, node| match best {
        Some(b) if cmp(node, b) != Ordering::Less => Some(b),
        _ => Some(node),
    })
}

fn highest_priority(nodes: &[Node]) -> Option<&Node> {
    nodes.iter().fold(None, |best: Option<&Node>, node| match best {
        Some(b) if node.priority() <= b.priority() => Some(b),
        _ => Some(node),
    })
}

/// Open nodes plus node-id allocation.
#[derive(Debug, Default)]
pub struct Tree {
    children: Vec<Node>,
    siblings: Vec<Node>,
    leaves: Vec<Node>,
    next_id: NodeId,
}

impl Tree {
    /// Create a tree whose only open node is the root (as a leaf).
    pub fn with_root(root: Node) -> Self {
        let next_id = root.id() + 1;
        Self {
            children: Vec::new(),
            siblings: Vec::new(),
            leaves: vec![root],
            next_id,
        }
    }

    pub fn allocate_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Attach a child to the current focus node.
    pub fn add_child(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn open_nodes(&self) -> OpenNodes<'_> {
        OpenNodes::new(&self.children, &self.siblings, &self.leaves)
    }

    pub fn len(&self) -> usize {
        self.children.len() + self.siblings.len() + self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove `id` from the open set and make it the new focus node,
    /// re-categorizing the remaining open nodes.
    pub fn focus(&mut self, id: NodeId) -> Option<(Node, NodeCategory)> {
        if let Some(pos) = self.children.iter().position(|n| n.id() == id) {
            let node = self.children.swap_remove(pos);
            let old_siblings = std::mem::take(&mut self.siblings);
            self.leaves.extend(old_siblings);
            self.siblings = std::mem::take(&mut self.children);
            return Some((node, NodeCategory::Child));
        }
        if let Some(pos) = self.siblings.iter().position(|n| n.id() == id) {
            let node = self.siblings.swap_remove(pos);
            let children = std::mem::take(&mut self.children);
            self.leaves.extend(children);
            return Some((node, NodeCategory::Sibling));
        }
        if let Some(pos) = self.leaves.iter().position(|n| n.id() == id) {
            let node = self.leaves.swap_remove(pos);
            let children = std::mem::take(&mut self.children);
            let siblings = std::mem::take(&mut self.siblings);
            self.leaves.extend(children);
            self.leaves.extend(siblings);
            return Some((node, NodeCategory::Leaf));
        }
        None
    }

    /// Drop every open node whose lower bound reaches `cutoff`.
    ///
    /// Returns the number of pruned nodes.
    pub fn prune(&mut self, cutoff: f64) -> usize {
        let before = self.len();
        self.children.retain(|n| !n.can_prune(cutoff));
        self.siblings.retain(|n| !n.can_prune(cutoff));
        self.leaves.retain(|n| !n.can_prune(cutoff));
        before - self.len()
    }

    /// Smallest lower bound over all open nodes, `+inf` if none are open.
    pub fn lower_bound(&self) -> f64 {
        self.open_nodes()
            .iter()
            .map(Node::lower_bound)
            .fold(f64::INFINITY, f64::min)
    }

    /// Drop all open nodes.
    pub fn clear(&mut self) {
        self.children.clear();
        self.siblings.clear();
        self.leaves.clear();
    }
}
