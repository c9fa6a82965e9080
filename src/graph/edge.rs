use super::node::NodeId;

use serde::{Deserialize, Serialize};

/// Undirected connection between two layout nodes.
///
/// Stored with the smaller id in `from`, so `[a, b]` and `[b, a]` in an asset
/// compare and deduplicate as one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}

impl Edge {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        Edge { from, to }
    }

    /// Both ends on the same node
    pub fn is_loop(&self) -> bool {
        self.from == self.to
    }
}

impl From<[usize; 2]> for Edge {
    fn from([a, b]: [usize; 2]) -> Self {
        Edge::new(NodeId(a), NodeId(b))
    }
}

impl From<Edge> for [usize; 2] {
    fn from(edge: Edge) -> Self {
        [edge.from.index(), edge.to.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_pairs_are_the_same_edge() {
        let forward = Edge::new(NodeId(1), NodeId(3));
        let backward = Edge::new(NodeId(3), NodeId(1));

        assert_eq!(forward, backward);
        assert_eq!(backward.from, NodeId(1));
        assert_eq!(backward.to, NodeId(3));
    }

    #[test]
    fn test_json_pair_round_trip() {
        let edge: Edge = serde_json::from_str("[4, 2]").unwrap();
        assert_eq!(edge, Edge::new(NodeId(2), NodeId(4)));
        assert!(!edge.is_loop());
        assert_eq!(serde_json::to_string(&edge).unwrap(), "[2,4]");

        let looped: Edge = serde_json::from_str("[5, 5]").unwrap();
        assert!(looped.is_loop());
    }
}
