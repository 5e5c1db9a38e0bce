use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Monotonic identifier attached to every issued player command.
pub type CommandSeq = u64;

/// Player capability a command exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    Play,
    Pause,
    Seek,
    SetRate,
}

impl Display for CommandKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Seek => "seek",
            Self::SetRate => "set-rate",
        };
        f.write_str(name)
    }
}

/// What the player is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlayerAction {
    Play,
    Pause,
    SeekTo { position_ms: u64 },
    SetRate { rate: f32, correct_pitch: bool },
}

impl PlayerAction {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Play => CommandKind::Play,
            Self::Pause => CommandKind::Pause,
            Self::SeekTo { .. } => CommandKind::Seek,
            Self::SetRate { .. } => CommandKind::SetRate,
        }
    }
}

/// One command for the host to run against its player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerCommand {
    pub seq: CommandSeq,
    pub action: PlayerAction,
}

impl PlayerCommand {
    pub fn kind(&self) -> CommandKind {
        self.action.kind()
    }
}

/// Status delivered by the player on every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    pub is_loaded: bool,
    pub position_millis: u64,
    pub is_playing: bool,
}

/// Video playback engine driven by the host.
///
/// Effects of a command are only guaranteed to be visible on a later
/// [`PlayerStatus`], never synchronously.
pub trait Player {
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn seek_to(&mut self, position_ms: u64) -> Result<()>;

    fn set_rate(&mut self, rate: f32, correct_pitch: bool) -> Result<()>;
}

/// Hands out increasing command sequence numbers.
#[derive(Debug, Clone)]
pub struct CommandSequencer {
    next: CommandSeq,
}

impl Default for CommandSequencer {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl CommandSequencer {
    pub fn starting_at(next: CommandSeq) -> Self {
        Self { next }
    }

    /// Sequence number the next command will receive.
    pub fn peek(&self) -> CommandSeq {
        self.next
    }

    pub fn issue(&mut self, action: PlayerAction) -> PlayerCommand {
        let seq = self.next;
        self.next += 1;
        PlayerCommand { seq, action }
    }
}

/// A command the player rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub seq: CommandSeq,
    pub kind: CommandKind,
    pub reason: String,
}

/// Sole owner of the player handle; runs commands in issue order.
#[derive(Debug)]
pub struct PlayerHost<P> {
    player: P,
}

impl<P> PlayerHost<P>
where
    P: Player,
{
    pub fn new(player: P) -> Self {
        Self { player }
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    /// Runs `commands` and collects the ones that failed.
    ///
    /// A failing command does not stop the remaining ones.
    pub fn dispatch(&mut self, commands: &[PlayerCommand]) -> Vec<CommandFailure> {
        let mut failures = Vec::new();
        for command in commands {
            let result = match command.action {
                PlayerAction::Play => self.player.play(),
                PlayerAction::Pause => self.player.pause(),
                PlayerAction::SeekTo { position_ms } => self.player.seek_to(position_ms),
                PlayerAction::SetRate {
                    rate,
                    correct_pitch,
                } => self.player.set_rate(rate, correct_pitch),
            };

            match result {
                Ok(()) => debug!(seq = command.seq, kind = %command.kind(), "player command sent"),
                Err(error) => {
                    warn!(seq = command.seq, kind = %command.kind(), %error, "player command failed");
                    failures.push(CommandFailure {
                        seq: command.seq,
                        kind: command.kind(),
                        reason: error.to_string(),
                    });
                }
            }
        }
        failures
    }
}
