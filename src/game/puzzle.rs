// game/puzzle.rs

use crate::graph::{LayoutHandle, Node, NodeId};

use log::{debug, error};
use serde::Serialize;
use std::fmt;

/// Error types for node activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleError {
    UnknownNode { node: NodeId, node_count: usize },
}

impl fmt::Display for ToggleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleError::UnknownNode { node, node_count } => write!(
                f,
                "Node {} is out of range for a puzzle with {} nodes",
                node, node_count
            ),
        }
    }
}

impl std::error::Error for ToggleError {}

/// A live puzzle built from a layout
#[derive(Debug, Clone)]
pub struct Puzzle {
    /// Layout the nodes were built from (read-only)
    layout: LayoutHandle,

    color_count: u8,

    /// Color every node must reach
    target_color: u8,

    /// Runtime node state, indexed by NodeId
    nodes: Vec<Node>,

    /// Player activations since the puzzle was dealt
    move_count: u32,

    /// Toggles applied to the solved state to deal this puzzle
    shuffle: Vec<NodeId>,
}

/// Plain view of a puzzle for rendering or printing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PuzzleSnapshot {
    pub layout: String,
    pub color_count: u8,
    pub target_color: u8,
    pub colors: Vec<u8>,
    pub move_count: u32,
    pub solved: bool,
}

impl Puzzle {
    /// Create a puzzle with every node already at the target color.
    /// Callers check `target_color < color_count` first.
    pub(crate) fn solved(layout: LayoutHandle, color_count: u8, target_color: u8) -> Self {
        // Indexed by id, whatever order the layout enumerates them in
        let nodes = (0..layout.node_count())
            .map(NodeId)
            .map(|id| Node::new(id, target_color, layout.neighbors(id).to_vec()))
            .collect();

        Puzzle {
            layout,
            color_count,
            target_color,
            nodes,
            move_count: 0,
            shuffle: Vec::new(),
        }
    }

    pub fn layout(&self) -> &LayoutHandle {
        &self.layout
    }

    pub fn color_count(&self) -> u8 {
        self.color_count
    }

    pub fn target_color(&self) -> u8 {
        self.target_color
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    /// The toggle sequence used to deal this puzzle
    pub fn shuffle(&self) -> &[NodeId] {
        &self.shuffle
    }

    /// Get the color of a node
    pub fn color(&self, node: NodeId) -> Option<u8> {
        self.nodes.get(node.index()).map(|n| n.color)
    }

    /// All colors in node id order (for display)
    pub fn colors(&self) -> Vec<u8> {
        self.nodes.iter().map(|n| n.color).collect()
    }

    /// Check if every node shows the target color
    pub fn is_solved(&self) -> bool {
        self.nodes.iter().all(|n| n.color == self.target_color)
    }

    /// Count nodes that are not yet at the target color
    pub fn mismatched(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.color != self.target_color)
            .count()
    }

    /// Apply a player activation and report whether the puzzle is now solved
    pub fn activate(&mut self, node: NodeId) -> Result<bool, ToggleError> {
        self.toggle(node)?;
        self.move_count += 1;

        let solved = self.is_solved();
        debug!(
            "Activated node {} (move {}), {} nodes off target",
            node,
            self.move_count,
            self.mismatched()
        );
        Ok(solved)
    }

    /// Advance a node and each of its neighbors one color
    pub(crate) fn toggle(&mut self, node: NodeId) -> Result<(), ToggleError> {
        if node.index() >= self.nodes.len() {
            let err = ToggleError::UnknownNode {
                node,
                node_count: self.nodes.len(),
            };
            error!("{}", err);
            return Err(err);
        }

        let color_count = self.color_count;
        self.nodes[node.index()].advance(color_count);
        // Neighbor ids were validated against the layout when it was built
        for i in 0..self.nodes[node.index()].degree() {
            let neighbor = self.nodes[node.index()].neighbors()[i];
            self.nodes[neighbor.index()].advance(color_count);
        }
        Ok(())
    }

    pub(crate) fn record_shuffle(&mut self, shuffle: Vec<NodeId>) {
        self.shuffle = shuffle;
    }

    pub fn snapshot(&self) -> PuzzleSnapshot {
        PuzzleSnapshot {
            layout: self.layout.name().to_string(),
            color_count: self.color_count,
            target_color: self.target_color,
            colors: self.colors(),
            move_count: self.move_count,
            solved: self.is_solved(),
        }
    }

    /// Give back the layout handle so it can be released to its store
    pub fn into_layout(self) -> LayoutHandle {
        self.layout
    }
}
