// game/session.rs

use crate::config::SessionSettings;
use crate::game::difficulty::{DifficultyConfig, DifficultyResolver};
use crate::game::events::{EventSink, SessionEvent};
use crate::game::generator::{GenerateError, PuzzleGenerator};
use crate::game::library::LayoutStore;
use crate::game::progression::ProgressionTracker;
use crate::game::puzzle::{Puzzle, ToggleError};
use crate::graph::NodeId;

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use std::fmt;

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    /// Puzzle dealt, clock not yet running
    Countdown,
    PuzzleActive,
    /// Solved, waiting for the next puzzle to be requested
    PuzzleSolved,
    TimedOut,
    Ended,
    /// A configuration or layout problem stopped puzzle generation
    Inert,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error types for session input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    NotAccepting(SessionPhase),
    NoPuzzle,
    Toggle(ToggleError),
    Generate(GenerateError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotAccepting(phase) => {
                write!(f, "Session does not accept this while {}", phase)
            }
            SessionError::NoPuzzle => write!(f, "No puzzle in progress"),
            SessionError::Toggle(e) => write!(f, "{}", e),
            SessionError::Generate(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ToggleError> for SessionError {
    fn from(e: ToggleError) -> Self {
        SessionError::Toggle(e)
    }
}

impl From<GenerateError> for SessionError {
    fn from(e: GenerateError) -> Self {
        SessionError::Generate(e)
    }
}

/// Score and clocks of a running session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub score: u32,
    pub combo_streak: u32,
    pub puzzles_solved: u32,
    /// Seconds left on the session clock
    pub remaining_time: f32,
    /// Seconds spent on the current puzzle
    pub puzzle_elapsed: f32,
    /// Seconds of countdown left
    pub countdown: f32,
}

/// Runs a timed sequence of puzzles.
///
/// Fully synchronous: the caller feeds frame time through [`tick`] and node
/// taps through [`on_node_activated`]. Presentation pauses between puzzles are
/// the caller's business (see [`SessionSettings::auto_advance`]).
///
/// [`tick`]: SessionController::tick
/// [`on_node_activated`]: SessionController::on_node_activated
pub struct SessionController<D, L, S>
where
    D: DifficultyResolver,
    L: LayoutStore,
    S: EventSink,
{
    resolver: D,
    store: L,
    sink: S,
    settings: SessionSettings,
    generator: PuzzleGenerator,
    rng: StdRng,
    phase: SessionPhase,
    progression: ProgressionTracker,
    config: Option<DifficultyConfig>,
    puzzle: Option<Puzzle>,
    state: Option<SessionState>,
    final_score: Option<u32>,
}

impl<D, L, S> SessionController<D, L, S>
where
    D: DifficultyResolver,
    L: LayoutStore,
    S: EventSink,
{
    pub fn new(resolver: D, store: L, sink: S, settings: SessionSettings, rng: StdRng) -> Self {
        SessionController {
            resolver,
            store,
            sink,
            settings,
            generator: PuzzleGenerator::new(),
            rng,
            phase: SessionPhase::Idle,
            progression: ProgressionTracker::default(),
            config: None,
            puzzle: None,
            state: None,
            final_score: None,
        }
    }

    // === Query Methods (for the presentation layer) ===

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.score)
    }

    pub fn combo_streak(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.combo_streak)
    }

    pub fn puzzles_solved(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.puzzles_solved)
    }

    pub fn remaining_time(&self) -> f32 {
        self.state.as_ref().map_or(0.0, |s| s.remaining_time)
    }

    /// Seconds left of the current puzzle's `time_per_puzzle`
    pub fn puzzle_time_remaining(&self) -> f32 {
        match (&self.state, &self.config) {
            (Some(state), Some(config)) => (config.time_per_puzzle - state.puzzle_elapsed).max(0.0),
            _ => 0.0,
        }
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn level(&self) -> u32 {
        self.progression.current_level
    }

    pub fn progression(&self) -> &ProgressionTracker {
        &self.progression
    }

    pub fn config(&self) -> Option<&DifficultyConfig> {
        self.config.as_ref()
    }

    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.puzzle.as_ref()
    }

    /// Node colors of the current puzzle (for display), empty without one
    pub fn colors(&self) -> Vec<u8> {
        self.puzzle.as_ref().map(Puzzle::colors).unwrap_or_default()
    }

    /// Score of the last session that ended
    pub fn final_score(&self) -> Option<u32> {
        self.final_score
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn store(&self) -> &L {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // === Mutation Methods (for handling game flow) ===

    /// Start a fresh session at `start_level`.
    ///
    /// A session already in progress is ended first. On a generation failure
    /// the session stays `Inert` and the error is returned.
    pub fn start_session(&mut self, start_level: u32) -> Result<(), SessionError> {
        if self.state.is_some() {
            self.end_session();
        }

        self.progression = ProgressionTracker::new(start_level);
        self.final_score = None;

        let config = self
            .resolver
            .resolve(self.progression.current_level, &mut self.rng);
        let time_limit = config.session_time_limit;
        self.state = Some(SessionState {
            score: 0,
            combo_streak: 0,
            puzzles_solved: 0,
            remaining_time: time_limit,
            puzzle_elapsed: 0.0,
            countdown: self.settings.countdown.max(0.0),
        });
        self.config = Some(config);

        info!(
            "Session started at level {} with {}s",
            self.progression.current_level, time_limit
        );
        self.sink.emit(&SessionEvent::SessionStarted {
            level: self.progression.current_level,
            time_limit,
        });

        self.deal()?;
        self.phase = if self.settings.countdown > 0.0 {
            SessionPhase::Countdown
        } else {
            SessionPhase::PuzzleActive
        };
        Ok(())
    }

    /// Forward a node tap to the current puzzle.
    ///
    /// Returns whether the tap solved the puzzle. Taps are rejected outside an
    /// active puzzle, including after the session has ended.
    pub fn on_node_activated(&mut self, node: NodeId) -> Result<bool, SessionError> {
        let accepting = match self.phase {
            SessionPhase::PuzzleActive => true,
            SessionPhase::TimedOut => self.settings.grace_on_timeout,
            _ => false,
        };
        if !accepting {
            debug!("Ignored activation of node {} while {}", node, self.phase);
            return Err(SessionError::NotAccepting(self.phase));
        }

        let puzzle = self.puzzle.as_mut().ok_or(SessionError::NoPuzzle)?;
        let solved = puzzle.activate(node)?;
        self.sink.emit(&SessionEvent::NodeActivated { node, solved });

        if solved {
            self.record_solve();
        }
        Ok(solved)
    }

    /// Deal the next puzzle after a solve, or end the session if too little
    /// time is left to play it.
    pub fn next_puzzle(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::PuzzleSolved {
            return Err(SessionError::NotAccepting(self.phase));
        }

        if self.remaining_time() <= self.settings.safety_margin {
            info!(
                "Only {:.1}s left, not dealing another puzzle",
                self.remaining_time()
            );
            self.phase = SessionPhase::TimedOut;
            self.sink.emit(&SessionEvent::TimedOut);
            self.end_session();
            return Ok(());
        }

        self.config = Some(
            self.resolver
                .resolve(self.progression.current_level, &mut self.rng),
        );
        self.deal()?;
        self.phase = SessionPhase::PuzzleActive;
        Ok(())
    }

    /// Abandon the current puzzle for a new one at the same level.
    /// Abandoning breaks the combo streak.
    pub fn skip_puzzle(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::PuzzleActive {
            return Err(SessionError::NotAccepting(self.phase));
        }

        self.break_combo();
        self.config = Some(
            self.resolver
                .resolve(self.progression.current_level, &mut self.rng),
        );
        self.deal()
    }

    /// Advance the countdown and clocks by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let mut dt = dt;
        if self.phase == SessionPhase::Countdown {
            let Some(state) = self.state.as_mut() else {
                return;
            };
            state.countdown -= dt;
            if state.countdown > 0.0 {
                return;
            }
            // Time past the end of the countdown goes to the session clock
            dt = -state.countdown;
            state.countdown = 0.0;
            self.phase = SessionPhase::PuzzleActive;
            debug!("Countdown finished");
        }

        if !matches!(
            self.phase,
            SessionPhase::PuzzleActive | SessionPhase::PuzzleSolved
        ) {
            return;
        }

        let time_per_puzzle = if self.settings.slow_puzzle_breaks_combo {
            self.config.as_ref().map_or(0.0, |c| c.time_per_puzzle)
        } else {
            0.0
        };
        let active = self.phase == SessionPhase::PuzzleActive;
        let Some(state) = self.state.as_mut() else {
            return;
        };

        state.remaining_time = (state.remaining_time - dt).max(0.0);

        let mut overran = false;
        if active {
            let before = state.puzzle_elapsed;
            state.puzzle_elapsed += dt;
            overran = time_per_puzzle > 0.0
                && before < time_per_puzzle
                && state.puzzle_elapsed >= time_per_puzzle;
        }
        let expired = state.remaining_time <= 0.0;

        if overran {
            debug!("Puzzle took longer than {}s", time_per_puzzle);
            self.break_combo();
        }
        if expired {
            self.on_session_timer_expired();
        }
    }

    /// The session clock ran out.
    ///
    /// With a grace window the current puzzle stays playable until it is
    /// solved or the caller ends the session; otherwise the session ends now.
    pub fn on_session_timer_expired(&mut self) {
        let previous = self.phase;
        if matches!(
            previous,
            SessionPhase::Idle | SessionPhase::Ended | SessionPhase::Inert | SessionPhase::TimedOut
        ) {
            return;
        }

        if let Some(state) = self.state.as_mut() {
            state.remaining_time = 0.0;
        }
        self.phase = SessionPhase::TimedOut;
        info!("Session timed out with score {}", self.score());
        self.sink.emit(&SessionEvent::TimedOut);

        let grace = self.settings.grace_on_timeout
            && previous == SessionPhase::PuzzleActive
            && self.puzzle.is_some();
        if !grace {
            self.end_session();
        }
    }

    /// End the session, report the final score and discard all puzzle and
    /// session state.
    ///
    /// Safe to call at any point and more than once; only the first call after
    /// a session starts emits `SessionEnded`.
    pub fn end_session(&mut self) -> Option<u32> {
        let Some(state) = self.state.take() else {
            return self.final_score;
        };

        self.discard_puzzle();
        self.config = None;
        self.phase = SessionPhase::Ended;
        self.final_score = Some(state.score);

        info!(
            "Session ended: score {}, {} puzzles solved, reached level {}",
            state.score, state.puzzles_solved, self.progression.current_level
        );
        self.sink.emit(&SessionEvent::SessionEnded {
            final_score: state.score,
        });
        self.final_score
    }

    // === Internals ===

    /// Replace the current puzzle with a fresh one for the current config
    fn deal(&mut self) -> Result<(), SessionError> {
        self.discard_puzzle();

        let Some(config) = self.config.as_ref() else {
            return Err(SessionError::NoPuzzle);
        };

        match self
            .generator
            .generate(config, &mut self.store, &mut self.rng)
        {
            Ok(puzzle) => {
                self.sink.emit(&SessionEvent::PuzzleStarted {
                    level: config.level,
                    layout: puzzle.layout().name().to_string(),
                    color_count: puzzle.color_count(),
                    target_color: puzzle.target_color(),
                });
                if let Some(state) = self.state.as_mut() {
                    state.puzzle_elapsed = 0.0;
                }
                self.puzzle = Some(puzzle);
                Ok(())
            }
            Err(e) => {
                error!("Cannot deal a puzzle for level {}: {}", config.level, e);
                self.phase = SessionPhase::Inert;
                Err(SessionError::Generate(e))
            }
        }
    }

    fn discard_puzzle(&mut self) {
        if let Some(puzzle) = self.puzzle.take() {
            self.store.release(puzzle.into_layout());
        }
    }

    fn record_solve(&mut self) {
        let (Some(state), Some(config)) = (self.state.as_mut(), self.config.as_ref()) else {
            return;
        };

        state.combo_streak += 1;
        state.puzzles_solved += 1;
        let earned = config.earned_score(state.combo_streak);
        state.score = state.score.saturating_add(earned);
        let combo_streak = state.combo_streak;

        self.progression.advance_level();

        info!(
            "Puzzle solved: +{} (combo {}), score {}, next level {}",
            earned, combo_streak, state.score, self.progression.current_level
        );
        self.sink.emit(&SessionEvent::PuzzleSolved {
            earned,
            combo_streak,
        });

        if self.phase == SessionPhase::TimedOut {
            // Solved inside the grace window
            self.end_session();
            return;
        }

        self.phase = SessionPhase::PuzzleSolved;
        if self.settings.auto_advance {
            if let Err(e) = self.next_puzzle() {
                warn!("Could not continue after solve: {}", e);
            }
        }
    }

    fn break_combo(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.combo_streak == 0 {
            return;
        }

        let streak = state.combo_streak;
        state.combo_streak = 0;
        debug!("Combo streak of {} broken", streak);
        self.sink.emit(&SessionEvent::ComboBroken { streak });
    }
}
