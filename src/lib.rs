//! Neuron Graph: a timed colour-toggle puzzle played on small graphs.
//!
//! Tapping a node advances the colour of that node and of every neighbor by one
//! step, wrapping at the colour count. A puzzle is solved when every node shows
//! the target colour. Puzzles are dealt by shuffling a solved board with the
//! same forward toggles, so every dealt puzzle can be solved.
//!
//! [`game::SessionController`] strings puzzles into a timed session with
//! scoring, combo streaks and level progression. Rendering, input mapping and
//! audio live outside this crate and listen through [`game::EventSink`].

pub mod config;
pub mod game;
pub mod graph;
