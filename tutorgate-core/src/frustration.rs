//! Frustration detection
//!
//! Maps a student utterance to a frustration signal by case-insensitive
//! substring matching against a fixed phrase list. Two shapes are exposed:
//! a one-shot boolean and a leveled score in `[0, 5]` that accumulates
//! across a session.

use serde::{Deserialize, Serialize};

/// Upper bound of the leveled score.
pub const MAX_LEVEL: f32 = 5.0;

/// Increase applied when a phrase matches.
pub const LEVEL_STEP_UP: f32 = 1.0;

/// Decay applied on every turn without a match.
pub const LEVEL_DECAY: f32 = 0.25;

/// Canonical frustration phrases, lower-case.
pub const FRUSTRATION_PHRASES: &[&str] = &[
    "you are dumb",
    "answer me fast",
    "just tell me",
    "this is stupid",
    "give me the answer",
    "i give up",
    "too hard",
    "stop asking",
    "just give me",
    "tell me directly",
    "wasting my time",
    "i'm frustrated",
    "frustrated",
    "annoying",
    "don't get it",
];

fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2018}', '\u{2019}'], "'")
}

/// Returns the first phrase contained in `text`, if any.
pub fn matched_phrase(text: &str) -> Option<&'static str> {
    let lower = normalize(text);
    FRUSTRATION_PHRASES
        .iter()
        .find(|phrase| lower.contains(*phrase))
        .copied()
}

/// Boolean classifier: true if any frustration phrase occurs in `text`.
pub fn is_frustrated(text: &str) -> bool {
    matched_phrase(text).is_some()
}

/// Leveled classifier: `min(level + 1, 5)` on a match, `max(level - 0.25, 0)` otherwise.
///
/// `level` is clamped into range first so a corrupted value never escapes `[0, 5]`.
pub fn next_level(level: f32, text: &str) -> f32 {
    let level = if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, MAX_LEVEL)
    };
    if is_frustrated(text) {
        (level + LEVEL_STEP_UP).min(MAX_LEVEL)
    } else {
        (level - LEVEL_DECAY).max(0.0)
    }
}

/// How frustration carries from one turn to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStrategy {
    /// Each message is judged on its own; frustrated turns count as level 5.
    OneShot,
    /// Score accumulates and decays across the session.
    #[default]
    Decaying,
}

/// Per-session frustration state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrustrationState {
    Flag(bool),
    Level(f32),
}

impl FrustrationState {
    pub fn new(strategy: EscalationStrategy) -> Self {
        match strategy {
            EscalationStrategy::OneShot => FrustrationState::Flag(false),
            EscalationStrategy::Decaying => FrustrationState::Level(0.0),
        }
    }

    /// Fold one user utterance into the state.
    pub fn observe(&mut self, text: &str) {
        *self = match *self {
            FrustrationState::Flag(_) => FrustrationState::Flag(is_frustrated(text)),
            FrustrationState::Level(level) => FrustrationState::Level(next_level(level, text)),
        };
    }

    /// Back to calm, keeping the strategy.
    pub fn reset(&mut self) {
        *self = match *self {
            FrustrationState::Flag(_) => FrustrationState::Flag(false),
            FrustrationState::Level(_) => FrustrationState::Level(0.0),
        };
    }

    /// Numeric level handed to backend adapters.
    pub fn level(&self) -> f32 {
        match *self {
            FrustrationState::Flag(true) => MAX_LEVEL,
            FrustrationState::Flag(false) => 0.0,
            FrustrationState::Level(level) => level,
        }
    }

    /// True when the most recent signal should be treated as frustration.
    pub fn is_frustrated(&self) -> bool {
        match *self {
            FrustrationState::Flag(flag) => flag,
            FrustrationState::Level(level) => level >= 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_phrase_matches_in_any_case_and_position() {
        for phrase in FRUSTRATION_PHRASES {
            let text = format!("Well... {} OK?", phrase.to_uppercase());
            assert!(is_frustrated(&text), "phrase not detected: {phrase}");
        }
    }

    #[test]
    fn test_calm_text_is_not_frustrated() {
        assert!(!is_frustrated("How do I solve this quadratic equation?"));
        assert!(!is_frustrated("explain photosynthesis"));
    }

    #[test]
    fn test_substring_not_whole_word() {
        assert!(is_frustrated("honestly i don't get it at all"));
        assert!(is_frustrated("I don\u{2019}t get it"));
    }

    #[test]
    fn test_example_sentence() {
        let text = "Can you just tell me the answer, this is stupid";
        assert!(is_frustrated(text));
        assert_eq!(next_level(2.0, text), 3.0);
    }

    #[test]
    fn test_level_clamps() {
        assert_eq!(next_level(5.0, "i give up"), 5.0);
        assert_eq!(next_level(4.5, "i give up"), 5.0);
        assert_eq!(next_level(0.0, "what is a cell?"), 0.0);
        assert_eq!(next_level(0.1, "what is a cell?"), 0.0);
        assert_eq!(next_level(1.0, "what is a cell?"), 0.75);
        assert_eq!(next_level(12.0, "what is a cell?"), 4.75);
        assert_eq!(next_level(f32::NAN, "i give up"), 1.0);
    }

    #[test]
    fn test_level_stays_in_range_over_a_session() {
        let turns = [
            "this is stupid",
            "i give up",
            "just tell me",
            "too hard",
            "answer me fast",
            "you are dumb",
            "ok",
            "fine",
        ];
        let mut level = 0.0;
        for turn in turns {
            level = next_level(level, turn);
            assert!((0.0..=MAX_LEVEL).contains(&level));
        }
        assert_eq!(level, 4.5);
    }

    #[test]
    fn test_state_one_shot_does_not_accumulate() {
        let mut state = FrustrationState::new(EscalationStrategy::OneShot);
        state.observe("this is stupid");
        assert!(state.is_frustrated());
        assert_eq!(state.level(), MAX_LEVEL);
        state.observe("what about cells?");
        assert!(!state.is_frustrated());
        assert_eq!(state.level(), 0.0);
    }

    #[test]
    fn test_state_reset_keeps_strategy() {
        let mut state = FrustrationState::new(EscalationStrategy::Decaying);
        state.observe("i give up");
        state.observe("i give up");
        assert_eq!(state.level(), 2.0);
        state.reset();
        assert_eq!(state, FrustrationState::Level(0.0));
    }

    #[test]
    fn test_one_shot_flag_cleared_by_reset() {
        let mut state = FrustrationState::new(EscalationStrategy::OneShot);
        state.observe("this is stupid");
        assert!(state.is_frustrated());
        state.reset();
        assert_eq!(state, FrustrationState::Flag(false));
        assert!(!state.is_frustrated());
    }
}
