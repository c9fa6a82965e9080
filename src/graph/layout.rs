//! Authored graph topologies and their validation.
//!
//! A [`LayoutSpec`] is the form a layout takes in an asset file. It only becomes
//! a [`Layout`] after [`validate`] accepts it, so everything downstream can rely
//! on dense ids, symmetric adjacency and no isolated nodes.

use super::edge::Edge;
use super::node::NodeId;

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Error types for layout validation and lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    EmptyNodes(String),
    MissingConnections(String),
    InvalidNodeIds(String),
    SelfLoop(String, NodeId),
    DanglingNeighbor {
        layout: String,
        node: NodeId,
        missing: NodeId,
    },
    IsolatedNode(String, NodeId),
    UnknownLayout(String),
    Parse(String),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::EmptyNodes(l) => write!(f, "Layout '{}' has no nodes", l),
            LayoutError::MissingConnections(l) => {
                write!(f, "Layout '{}' has no connection container", l)
            }
            LayoutError::InvalidNodeIds(l) => {
                write!(f, "Layout '{}' node ids are not dense and unique from 0", l)
            }
            LayoutError::SelfLoop(l, n) => {
                write!(f, "Layout '{}' connects node {} to itself", l, n)
            }
            LayoutError::DanglingNeighbor {
                layout,
                node,
                missing,
            } => write!(
                f,
                "Layout '{}' node {} references missing node {}",
                layout, node, missing
            ),
            LayoutError::IsolatedNode(l, n) => {
                write!(f, "Layout '{}' node {} has no neighbors", l, n)
            }
            LayoutError::UnknownLayout(l) => write!(f, "Unknown layout '{}'", l),
            LayoutError::Parse(msg) => write!(f, "Cannot parse layouts: {}", msg),
        }
    }
}

impl std::error::Error for LayoutError {}

/// A layout as authored in an asset file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeId>,
    /// Rendered connections. Absent means the asset is malformed, which is
    /// different from present-but-empty.
    #[serde(default)]
    pub connections: Option<Vec<Edge>>,
}

impl LayoutSpec {
    /// Build a spec with nodes `0..node_count` and the given connections
    pub fn new(name: &str, node_count: usize, connections: &[(usize, usize)]) -> Self {
        LayoutSpec {
            name: name.to_string(),
            nodes: (0..node_count).map(NodeId).collect(),
            connections: Some(
                connections
                    .iter()
                    .map(|&(a, b)| Edge::new(NodeId(a), NodeId(b)))
                    .collect(),
            ),
        }
    }

    /// Advisory check: logs the diagnostic and reports whether the layout is usable
    pub fn is_valid(&self) -> bool {
        match validate(self) {
            Ok(()) => true,
            Err(e) => {
                warn!("Layout rejected: {}", e);
                false
            }
        }
    }
}

/// Check an authored layout without building anything from it
pub fn validate(spec: &LayoutSpec) -> Result<(), LayoutError> {
    let name = || spec.name.clone();

    if spec.nodes.is_empty() {
        return Err(LayoutError::EmptyNodes(name()));
    }

    let Some(connections) = &spec.connections else {
        return Err(LayoutError::MissingConnections(name()));
    };

    let mut ids: Vec<usize> = spec.nodes.iter().map(|n| n.index()).collect();
    ids.sort_unstable();
    if ids.iter().enumerate().any(|(i, &id)| i != id) {
        return Err(LayoutError::InvalidNodeIds(name()));
    }

    let node_count = ids.len();
    let mut degree = vec![0usize; node_count];

    for edge in connections {
        if edge.is_loop() {
            return Err(LayoutError::SelfLoop(name(), edge.from));
        }
        // Canonical order puts the larger id in `to`
        if edge.to.index() >= node_count {
            return Err(LayoutError::DanglingNeighbor {
                layout: name(),
                node: edge.from,
                missing: edge.to,
            });
        }
        degree[edge.from.index()] += 1;
        degree[edge.to.index()] += 1;
    }

    if let Some(isolated) = degree.iter().position(|&d| d == 0) {
        return Err(LayoutError::IsolatedNode(name(), NodeId(isolated)));
    }

    Ok(())
}

/// An immutable, validated graph topology used as a puzzle template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    name: String,
    node_ids: Vec<NodeId>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<NodeId>>,
}

impl Layout {
    /// Validate a spec and build the adjacency lists from it
    pub fn from_spec(spec: &LayoutSpec) -> Result<Self, LayoutError> {
        validate(spec)?;

        let node_count = spec.nodes.len();
        // Duplicate connections collapse into one edge
        let edges: BTreeSet<Edge> = spec.connections.iter().flatten().copied().collect();

        let mut adjacency = vec![Vec::new(); node_count];
        for edge in &edges {
            adjacency[edge.from.index()].push(edge.to);
            adjacency[edge.to.index()].push(edge.from);
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }

        Ok(Layout {
            name: spec.name.clone(),
            node_ids: spec.nodes.clone(),
            edges: edges.into_iter().collect(),
            adjacency,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    /// Node ids in the order the layout was authored
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_ids.len()
    }

    /// Get all neighbors of a node, empty for unknown ids
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adjacency
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a).contains(&b)
    }
}

/// A leased reference to a layout.
///
/// Obtained from a [`crate::game::LayoutStore`] and handed back to it once the
/// puzzle built from it is discarded.
#[derive(Debug, Clone)]
pub struct LayoutHandle {
    layout: Arc<Layout>,
    lease: u64,
}

impl LayoutHandle {
    pub fn new(layout: Arc<Layout>, lease: u64) -> Self {
        LayoutHandle { layout, lease }
    }

    pub fn lease(&self) -> u64 {
        self.lease
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }
}

impl Deref for LayoutHandle {
    type Target = Layout;

    fn deref(&self) -> &Layout {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> LayoutSpec {
        LayoutSpec::new("triangle", 3, &[(0, 1), (1, 2), (2, 0)])
    }

    #[test]
    fn test_valid_triangle() {
        let spec = triangle();
        assert!(spec.is_valid());

        let layout = Layout::from_spec(&spec).unwrap();
        assert_eq!(layout.node_count(), 3);
        assert_eq!(layout.edges().len(), 3);
        assert_eq!(layout.neighbors(NodeId(0)), &[NodeId(1), NodeId(2)]);
    }

    #[test]
    fn test_authored_node_order_kept() {
        let spec = LayoutSpec {
            name: "bent".to_string(),
            nodes: vec![NodeId(2), NodeId(0), NodeId(1)],
            connections: Some(vec![Edge::new(NodeId(2), NodeId(0)), Edge::new(NodeId(0), NodeId(1))]),
        };
        let layout = Layout::from_spec(&spec).unwrap();

        assert_eq!(layout.node_ids(), &[NodeId(2), NodeId(0), NodeId(1)]);
        assert_eq!(layout.node_count(), 3);
        assert!(layout.contains(NodeId(2)));
        assert_eq!(layout.neighbors(NodeId(0)), &[NodeId(1), NodeId(2)]);
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let spec = LayoutSpec::new("kite", 4, &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
        let layout = Layout::from_spec(&spec).unwrap();

        for &a in layout.node_ids() {
            for &b in layout.node_ids() {
                assert_eq!(
                    layout.are_adjacent(a, b),
                    layout.are_adjacent(b, a),
                    "Adjacency should be symmetric"
                );
            }
            assert!(!layout.are_adjacent(a, a));
        }
    }

    #[test]
    fn test_duplicate_connections_collapse() {
        let spec = LayoutSpec::new("pair", 2, &[(0, 1), (1, 0), (0, 1)]);
        let layout = Layout::from_spec(&spec).unwrap();

        assert_eq!(layout.edges().len(), 1);
        assert_eq!(layout.neighbors(NodeId(1)), &[NodeId(0)]);
    }

    #[test]
    fn test_empty_nodes_rejected() {
        let spec = LayoutSpec::new("empty", 0, &[]);
        assert_eq!(
            validate(&spec),
            Err(LayoutError::EmptyNodes("empty".to_string()))
        );
        assert!(!spec.is_valid());
    }

    #[test]
    fn test_missing_connections_rejected() {
        let mut spec = triangle();
        spec.connections = None;
        assert_eq!(
            validate(&spec),
            Err(LayoutError::MissingConnections("triangle".to_string()))
        );
    }

    #[test]
    fn test_isolated_node_rejected() {
        let spec = LayoutSpec::new("lonely", 4, &[(0, 1), (1, 2), (2, 0)]);
        assert_eq!(
            validate(&spec),
            Err(LayoutError::IsolatedNode("lonely".to_string(), NodeId(3)))
        );
    }

    #[test]
    fn test_dangling_neighbor_rejected() {
        let spec = LayoutSpec::new("dangling", 3, &[(0, 1), (1, 2), (2, 7)]);
        assert_eq!(
            validate(&spec),
            Err(LayoutError::DanglingNeighbor {
                layout: "dangling".to_string(),
                node: NodeId(2),
                missing: NodeId(7),
            })
        );
    }

    #[test]
    fn test_self_loop_rejected() {
        let spec = LayoutSpec::new("loop", 2, &[(0, 1), (1, 1)]);
        assert!(matches!(
            validate(&spec),
            Err(LayoutError::SelfLoop(_, NodeId(1)))
        ));
    }

    #[test]
    fn test_sparse_ids_rejected() {
        let mut spec = triangle();
        spec.nodes = vec![NodeId(0), NodeId(1), NodeId(5)];
        assert!(matches!(
            validate(&spec),
            Err(LayoutError::InvalidNodeIds(_))
        ));

        spec.nodes = vec![NodeId(0), NodeId(1), NodeId(1)];
        assert!(matches!(
            validate(&spec),
            Err(LayoutError::InvalidNodeIds(_))
        ));
    }

    #[test]
    fn test_spec_from_json() {
        let json = r#"{ "name": "bar", "nodes": [0, 1], "connections": [[1, 0]] }"#;
        let spec: LayoutSpec = serde_json::from_str(json).unwrap();
        assert!(spec.is_valid());

        let json = r#"{ "name": "bare", "nodes": [0, 1] }"#;
        let spec: LayoutSpec = serde_json::from_str(json).unwrap();
        assert!(spec.connections.is_none());
        assert!(!spec.is_valid());
    }

    #[test]
    fn test_handle_derefs_to_layout() {
        let layout = Arc::new(Layout::from_spec(&triangle()).unwrap());
        let handle = LayoutHandle::new(layout.clone(), 7);

        assert_eq!(handle.name(), "triangle");
        assert_eq!(handle.lease(), 7);
        assert!(Arc::ptr_eq(handle.layout(), &layout));
    }
}
