// game/progression.rs

/// Level counter advanced once per solved puzzle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionTracker {
    pub current_level: u32,
    /// Level the session started at
    pub start_level: u32,
}

impl Default for ProgressionTracker {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ProgressionTracker {
    /// Start at `level` as given. Levels below the first tier resolve to it.
    pub fn new(level: u32) -> Self {
        Self {
            current_level: level,
            start_level: level,
        }
    }

    /// Advance to the next level. Levels past the last tier keep counting.
    pub fn advance_level(&mut self) {
        self.current_level = self.current_level.saturating_add(1);
    }

    /// Levels climbed since the start
    pub fn levels_gained(&self) -> u32 {
        self.current_level - self.start_level
    }

    /// Progress through the authored levels as a percentage (0.0 to 100.0)
    pub fn progress_percentage(&self, max_level: u32) -> f32 {
        if max_level == 0 {
            return 100.0;
        }
        (self.current_level.min(max_level) as f32 / max_level as f32) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_default() {
        let tracker = ProgressionTracker::default();
        assert_eq!(tracker.current_level, 1);
        assert_eq!(tracker.levels_gained(), 0);
    }

    #[test]
    fn test_level_zero_kept() {
        let mut tracker = ProgressionTracker::new(0);
        assert_eq!(tracker.current_level, 0);

        tracker.advance_level();
        assert_eq!(tracker.current_level, 1);
        assert_eq!(tracker.levels_gained(), 1);
    }

    #[test]
    fn test_advance_level() {
        let mut tracker = ProgressionTracker::new(4);

        tracker.advance_level();
        tracker.advance_level();
        assert_eq!(tracker.current_level, 6);
        assert_eq!(tracker.start_level, 4);
        assert_eq!(tracker.levels_gained(), 2);
    }

    #[test]
    fn test_advance_does_not_wrap() {
        let mut tracker = ProgressionTracker::new(u32::MAX);
        tracker.advance_level();
        assert_eq!(tracker.current_level, u32::MAX);

        let mut tracker = ProgressionTracker::new(50);
        tracker.advance_level();
        assert_eq!(tracker.current_level, 51);
        assert_eq!(tracker.progress_percentage(50), 100.0);
    }

    #[test]
    fn test_progress_percentage() {
        let tracker = ProgressionTracker::new(25);

        let percentage = tracker.progress_percentage(50);
        assert!((percentage - 50.0).abs() < 0.01);
        assert_eq!(tracker.progress_percentage(0), 100.0);
    }
}
