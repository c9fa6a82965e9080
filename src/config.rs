use serde::{Deserialize, Serialize};

/// No new puzzle is dealt with this little session time left (seconds)
pub const DEFAULT_SAFETY_MARGIN: f32 = 2.0;

/// Session behavior that is independent of difficulty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Minimum remaining time needed to deal another puzzle
    pub safety_margin: f32,
    /// Seconds of countdown before the session clock starts
    pub countdown: f32,
    /// Deal the next puzzle as soon as one is solved. When false the caller
    /// finishes its presentation pause and calls `next_puzzle`.
    pub auto_advance: bool,
    /// Keep the current puzzle playable after the clock runs out
    pub grace_on_timeout: bool,
    /// Break the combo streak when a puzzle outlasts its tier's
    /// `time_per_puzzle`. Off, the streak only counts consecutive solves.
    pub slow_puzzle_breaks_combo: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            safety_margin: DEFAULT_SAFETY_MARGIN,
            countdown: 0.0,
            auto_advance: true,
            grace_on_timeout: false,
            slow_puzzle_breaks_combo: false,
        }
    }
}

impl SessionSettings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = SessionSettings::from_json(r#"{ "countdown": 3.0 }"#).unwrap();

        assert_eq!(settings.countdown, 3.0);
        assert_eq!(settings.safety_margin, DEFAULT_SAFETY_MARGIN);
        assert!(settings.auto_advance);
        assert!(!settings.grace_on_timeout);
        assert!(!settings.slow_puzzle_breaks_combo);
    }

    #[test]
    fn test_full_settings_file() {
        let json = r#"{
            "safety_margin": 5.0,
            "countdown": 3.0,
            "auto_advance": false,
            "grace_on_timeout": true,
            "slow_puzzle_breaks_combo": true
        }"#;
        let settings = SessionSettings::from_json(json).unwrap();

        assert_eq!(settings.safety_margin, 5.0);
        assert!(!settings.auto_advance);
        assert!(settings.grace_on_timeout);
        assert!(settings.slow_puzzle_breaks_combo);
    }

    #[test]
    fn test_invalid_json() {
        assert!(SessionSettings::from_json("{ countdown").is_err());
    }
}
