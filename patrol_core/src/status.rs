//! Patrol mode and the per-tick result.
use std::fmt;
use std::time::Duration;

use crate::reaction::ReactionDecision;

/// Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatrolMode {
    #[default]
    Idle,
    Scanning,
    Reacting,
    Recovering,
    PostureSequence,
}

impl PatrolMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Reacting => "reacting",
            Self::Recovering => "recovering",
            Self::PostureSequence => "posture_sequence",
        }
    }
}

impl fmt::Display for PatrolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one control tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Mode at the end of the tick.
    pub mode: PatrolMode,
    /// How long to sleep before the next tick.
    pub sleep: Duration,
    /// Reaction taken this tick, if any.
    pub reaction: ReactionDecision,
    /// Whether the scan direction flipped this tick.
    pub reversed: bool,
}
