use serde::{Deserialize, Serialize};
use std::fmt;

/// Node identifier, dense and 0-based within a layout
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NodeId {
    pub const fn new(id: usize) -> Self {
        NodeId(id)
    }

    pub const fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    fn from(id: usize) -> Self {
        NodeId(id)
    }
}

/// Runtime state of one node in a live puzzle.
///
/// Built fresh from layout topology every time a puzzle is generated, so
/// colour changes never leak back into the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    /// Current colour in `[0, color_count)`
    pub color: u8,
    neighbors: Vec<NodeId>,
}

impl Node {
    pub fn new(id: NodeId, color: u8, neighbors: Vec<NodeId>) -> Self {
        Node {
            id,
            color,
            neighbors,
        }
    }

    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    /// Step the colour forward one place, wrapping at `color_count`.
    /// A zero colour count has no colours to step through.
    pub fn advance(&mut self, color_count: u8) {
        if color_count == 0 {
            return;
        }
        self.color = ((self.color as u16 + 1) % color_count as u16) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_wraps() {
        let mut node = Node::new(NodeId(0), 0, vec![NodeId(1)]);

        node.advance(3);
        assert_eq!(node.color, 1);
        node.advance(3);
        assert_eq!(node.color, 2);
        node.advance(3);
        assert_eq!(node.color, 0);
    }

    #[test]
    fn test_advance_at_max_color_count() {
        let mut node = Node::new(NodeId(0), 254, vec![]);
        node.advance(255);
        assert_eq!(node.color, 0);
    }

    #[test]
    fn test_advance_without_colors_is_a_no_op() {
        let mut node = Node::new(NodeId(0), 0, vec![]);
        node.advance(0);
        assert_eq!(node.color, 0);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(7).to_string(), "7");
        assert_eq!(NodeId::from(3).index(), 3);
    }
}
