use std::fmt::{Display, Formatter};

use crate::player::CommandKind;

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by stage transitions, range validation and player plumbing.
#[derive(Debug)]
pub enum EngineError {
    InvalidRange {
        start_ms: u64,
        end_ms: u64,
    },
    GapTooSmall {
        start_ms: u64,
        end_ms: u64,
        min_gap_ms: u64,
    },
    RangeOutOfBounds {
        end_ms: u64,
        duration_ms: u64,
    },
    MissingVideoUri,
    DegenerateDuration {
        duration_ms: u64,
    },
    WrongStage {
        expected: &'static str,
        actual: &'static str,
    },
    PlayerCommand {
        kind: CommandKind,
        reason: String,
    },
    InvalidConfig {
        reason: String,
    },
    ConfigParse(serde_json::Error),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange { start_ms, end_ms } => {
                write!(f, "start {start_ms}ms must be before end {end_ms}ms")
            }
            Self::GapTooSmall {
                start_ms,
                end_ms,
                min_gap_ms,
            } => write!(
                f,
                "clip {start_ms}..{end_ms}ms is shorter than the minimum of {min_gap_ms}ms"
            ),
            Self::RangeOutOfBounds {
                end_ms,
                duration_ms,
            } => write!(
                f,
                "end {end_ms}ms is past the video duration of {duration_ms}ms"
            ),
            Self::MissingVideoUri => write!(f, "no video selected"),
            Self::DegenerateDuration { duration_ms } => {
                write!(f, "video duration {duration_ms}ms is too short to trim")
            }
            Self::WrongStage { expected, actual } => {
                write!(f, "expected {expected} stage, currently in {actual} stage")
            }
            Self::PlayerCommand { kind, reason } => {
                write!(f, "player {kind} command failed: {reason}")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid config: {reason}"),
            Self::ConfigParse(err) => write!(f, "config could not be parsed ({err})"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigParse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::ConfigParse(value)
    }
}
