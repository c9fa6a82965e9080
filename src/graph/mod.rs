mod edge;
mod layout;
mod node;

pub use edge::Edge;
pub use layout::{Layout, LayoutError, LayoutHandle, LayoutSpec, validate};
pub use node::{Node, NodeId};
