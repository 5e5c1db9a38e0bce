//! UI-agnostic core of the trim-and-play flow.
//!
//! Everything here is sans-IO: components consume player notifications and
//! return [`PlayerCommand`]s for the host to run against a real [`Player`].

pub mod api;
pub mod boundary;
pub mod config;
pub mod error;
pub mod playback;
pub mod player;
pub mod preview;
pub mod session;
pub mod sim;
pub mod slider;
pub mod time;

pub use api::{Command, Engine, Event, NoticeAction, NoticeKind, StageSummary, UserNotice};
pub use boundary::{BoundaryAction, BoundaryPolicy, EndAction, boundary_action};
pub use config::{EngineConfig, PlaybackConfig, SliderConfig};
pub use error::{EngineError, Result};
pub use playback::{PlaybackController, PlaybackPhase, PlaybackSnapshot};
pub use player::{
    CommandFailure, CommandKind, CommandSeq, CommandSequencer, Player, PlayerAction,
    PlayerCommand, PlayerHost, PlayerStatus,
};
pub use preview::TrimPreview;
pub use session::{
    PlaybackParams, Stage, StageFlow, TrimParams, TrimRange, TrimSession, VideoAsset,
};
pub use sim::SimulatedPlayer;
pub use slider::{Handle, RangeSlider, TickMark};
pub use time::{MIN_GAP_MS, format_clock, px_to_time, time_to_px};
