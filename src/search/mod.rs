// Branch-and-bound search: nodes, the open-node tree and the driver.

mod engine;
mod incumbent;
mod node;
mod tree;

pub use engine::{BranchAndBound, SearchOutcome};
pub use incumbent::IncumbentTracker;
pub use node::{Node, NodeId};
pub use tree::{NodeCategory, OpenNodes, Tree};
