pub mod difficulty;
pub mod events;
pub mod generator;
pub mod library;
pub mod progression;
pub mod puzzle;
pub mod session;

// Public exports for session hosts
pub use difficulty::{ConfigError, DifficultyConfig, DifficultyResolver, DifficultyTable, Tier};
pub use events::{EventLog, EventSink, NullSink, SessionEvent};
pub use generator::{GenerateError, PuzzleGenerator};
pub use library::{LayoutLibrary, LayoutStore, Residency};
pub use progression::ProgressionTracker;
pub use puzzle::{Puzzle, PuzzleSnapshot, ToggleError};
pub use session::{SessionController, SessionError, SessionPhase, SessionState};
