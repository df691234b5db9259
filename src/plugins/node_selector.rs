// Node-selection protocol.

use std::cmp::Ordering;

use crate::domain::Result;
use crate::search::{Node, NodeId, OpenNodes};

use super::SolveInfo;

/// Registration data of a node selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSelectorProperties {
    pub name: String,
    pub description: String,
    /// Priority in standard mode; the highest one is active.
    pub standard_priority: i32,
    /// Priority in memory-saving mode.
    pub memsave_priority: i32,
}

impl NodeSelectorProperties {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            standard_priority: 0,
            memsave_priority: 0,
        }
    }

    pub fn with_priorities(mut self, standard: i32, memsave: i32) -> Self {
        self.standard_priority = standard;
        self.memsave_priority = memsave;
        self
    }

    pub fn priority(&self, memsave: bool) -> i32 {
        if memsave {
            self.memsave_priority
        } else {
            self.standard_priority
        }
    }
}

/// Answer of [`NodeSelector::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Process this open node next.
    Node(NodeId),
    /// Stop the search.
    Stop,
}

impl From<Option<&Node>> for Selection {
    fn from(node: Option<&Node>) -> Self {
        node.map_or(Selection::Stop, |n| Selection::Node(n.id()))
    }
}

/// A node selector plugin.
pub trait NodeSelector {
    /// Preference order over open nodes: `Less` means `a` is processed before `b`.
    ///
    /// Must be a total preorder; the engine and the [`OpenNodes`] accessors
    /// rely on it being consistent.
    fn compare(&self, a: &Node, b: &Node) -> Ordering;

    /// Pick the next node. Called once per search iteration with at least one
    /// open node. The default picks the best open node according to
    /// [`NodeSelector::compare`].
    fn select(&mut self, open: &OpenNodes<'_>) -> Result<Selection> {
        Ok(open.best_node(|a, b| self.compare(a, b)).into())
    }

    fn init(&mut self, _info: &SolveInfo<'_>) -> Result<()> {
        Ok(())
    }

    fn init_solve(&mut self, _info: &SolveInfo<'_>) -> Result<()> {
        Ok(())
    }

    fn exit_solve(&mut self, _info: &SolveInfo<'_>) -> Result<()> {
        Ok(())
    }

    fn exit(&mut self, _info: &SolveInfo<'_>) -> Result<()> {
        Ok(())
    }

    fn free(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BoundChange;

    struct Shallowest;

    impl NodeSelector for Shallowest {
        fn compare(&self, a: &Node, b: &Node) -> Ordering {
            a.depth().cmp(&b.depth())
        }
    }

    #[test]
    fn test_default_select_uses_compare() {
        let root = Node::root();
        let a = root.child(1, BoundChange::down(0, 0.5), 0.0, 0.0, 0.0);
        let b = a.child(2, BoundChange::down(1, 0.5), 0.0, 0.0, 0.0);
        let leaves = vec![b, a];
        let open = OpenNodes::new(&[], &[], &leaves);

        let mut sel = Shallowest;
        assert_eq!(sel.select(&open).unwrap(), Selection::Node(1));
    }

    #[test]
    fn test_priorities_by_mode() {
        let props = NodeSelectorProperties::new("s", "").with_priorities(10, -5);
        assert_eq!(props.priority(false), 10);
        assert_eq!(props.priority(true), -5);
    }
}
