//! Bounded playback: keeps an external player looping (or stopping) inside a
//! trim range.
//!
//! The controller is sans-IO. Every entry point returns the
//! [`PlayerCommand`]s the host must run; outcomes come back as later
//! [`PlayerStatus`] notifications or as [`PlaybackController::command_failed`].
//!
//! Lifecycle:
//!
//! ```text
//! Uninitialized --loaded--> Seeking{resume: false} --confirmed--> Ready
//! Ready/Paused --play--> Playing --pause / range end--> Paused
//! Ready/Playing/Paused --restart--> Seeking{resume: true} --confirmed--> Playing
//! any --teardown--> Closed
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::boundary::{BoundaryAction, BoundaryPolicy, SeekGuard, boundary_action};
use crate::config::PlaybackConfig;
use crate::player::{CommandSeq, CommandSequencer, PlayerAction, PlayerCommand, PlayerStatus};
use crate::session::TrimRange;

/// Explicit playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackPhase {
    Uninitialized,
    /// Waiting for a notification near `target_ms`. `resume` is false for the
    /// initial seek and true for a restart.
    Seeking {
        target_ms: u64,
        resume: bool,
    },
    Ready,
    Playing,
    Paused,
    Closed,
}

impl PlaybackPhase {
    /// Returns true once reported positions are trusted.
    pub fn is_initialized(&self) -> bool {
        match self {
            Self::Ready | Self::Playing | Self::Paused => true,
            Self::Seeking { resume, .. } => *resume,
            Self::Uninitialized | Self::Closed => false,
        }
    }
}

/// Read-only view of the controller for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub phase: PlaybackPhase,
    pub range: TrimRange,
    pub position_ms: u64,
    pub is_playing: bool,
    pub rate: f32,
    pub looping: bool,
    pub initialized: bool,
    pub busy: bool,
}

#[derive(Debug, Clone, Copy)]
struct OptimisticPlay {
    seq: CommandSeq,
    previous: PlaybackPhase,
}

#[derive(Debug, Clone, Copy)]
struct PendingRate {
    seq: CommandSeq,
    previous_index: usize,
}

/// Drives one player inside one trim range.
#[derive(Debug, Clone)]
pub struct PlaybackController {
    range: TrimRange,
    config: PlaybackConfig,
    phase: PlaybackPhase,
    position_ms: u64,
    looping: bool,
    rate_index: usize,
    sequencer: CommandSequencer,
    seeks: SeekGuard,
    pending_pause: Option<CommandSeq>,
    pending_play: Option<OptimisticPlay>,
    pending_rate: Option<PendingRate>,
    unconfirmed: u32,
}

impl PlaybackController {
    pub fn new(range: TrimRange, config: PlaybackConfig) -> Self {
        Self::with_sequencer(range, config, CommandSequencer::default())
    }

    /// Creates a controller whose command numbers continue from `sequencer`.
    pub fn with_sequencer(
        range: TrimRange,
        config: PlaybackConfig,
        sequencer: CommandSequencer,
    ) -> Self {
        Self {
            range,
            phase: PlaybackPhase::Uninitialized,
            position_ms: range.start_ms,
            looping: config.looping,
            rate_index: config.default_rate_index(),
            sequencer,
            seeks: SeekGuard::new(config.stale_notification_budget, config.seek_tolerance_ms),
            pending_pause: None,
            pending_play: None,
            pending_rate: None,
            unconfirmed: 0,
            config,
        }
    }

    pub fn range(&self) -> TrimRange {
        self.range
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Last accepted position. Before initialization this is the requested
    /// seek target, not a confirmed device position.
    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn is_playing(&self) -> bool {
        matches!(
            self.phase,
            PlaybackPhase::Playing | PlaybackPhase::Seeking { resume: true, .. }
        )
    }

    pub fn is_initialized(&self) -> bool {
        self.phase.is_initialized()
    }

    /// True while positions are not yet trustworthy.
    pub fn is_busy(&self) -> bool {
        !self.is_initialized() || matches!(self.phase, PlaybackPhase::Seeking { .. })
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn rate(&self) -> f32 {
        self.config
            .rate_ladder
            .get(self.rate_index)
            .copied()
            .unwrap_or(1.0)
    }

    /// Sequence number the next issued command will carry.
    pub fn next_seq(&self) -> CommandSeq {
        self.sequencer.peek()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            phase: self.phase,
            range: self.range,
            position_ms: self.position_ms,
            is_playing: self.is_playing(),
            rate: self.rate(),
            looping: self.looping,
            initialized: self.is_initialized(),
            busy: self.is_busy(),
        }
    }

    /// Applies one player notification.
    pub fn on_status(&mut self, status: PlayerStatus) -> Vec<PlayerCommand> {
        match self.phase {
            PlaybackPhase::Closed => Vec::new(),
            PlaybackPhase::Uninitialized => self.begin_initialization(status),
            PlaybackPhase::Seeking { target_ms, resume } => {
                self.await_seek(status, target_ms, resume)
            }
            PlaybackPhase::Ready | PlaybackPhase::Playing | PlaybackPhase::Paused => {
                self.apply_status(status)
            }
        }
    }

    pub fn play(&mut self) -> Vec<PlayerCommand> {
        if !self.accepts_commands("play") || self.is_playing() {
            return Vec::new();
        }

        let mut commands = Vec::with_capacity(2);
        if !self.range.contains(self.position_ms) {
            commands.push(self.issue_seek_to_start());
        }

        let play = self.sequencer.issue(PlayerAction::Play);
        self.pending_play = Some(OptimisticPlay {
            seq: play.seq,
            previous: self.phase,
        });
        self.pending_pause = None;
        self.phase = PlaybackPhase::Playing;
        info!(position_ms = self.position_ms, "playback started");
        commands.push(play);
        commands
    }

    pub fn pause(&mut self) -> Vec<PlayerCommand> {
        if !self.accepts_commands("pause") || !self.is_playing() {
            return Vec::new();
        }

        let pause = self.issue_pause();
        self.unconfirmed = 0;
        info!(position_ms = self.position_ms, "playback paused");
        vec![pause]
    }

    pub fn toggle_play(&mut self) -> Vec<PlayerCommand> {
        if self.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Seeks to the range start and plays.
    pub fn restart(&mut self) -> Vec<PlayerCommand> {
        if !self.accepts_commands("restart") {
            return Vec::new();
        }

        let seek = self.issue_seek_to_start();
        let play = self.sequencer.issue(PlayerAction::Play);
        self.pending_play = Some(OptimisticPlay {
            seq: play.seq,
            previous: PlaybackPhase::Paused,
        });
        self.pending_pause = None;
        self.unconfirmed = 0;
        self.phase = PlaybackPhase::Seeking {
            target_ms: self.range.start_ms,
            resume: true,
        };
        info!(target_ms = self.range.start_ms, "playback restarted");
        vec![seek, play]
    }

    /// Moves to the next rate on the ladder, wrapping around.
    pub fn cycle_rate(&mut self) -> Vec<PlayerCommand> {
        let ladder_len = self.config.rate_ladder.len();
        if !self.accepts_commands("set-rate") || ladder_len == 0 {
            return Vec::new();
        }

        let previous_index = self.rate_index;
        self.rate_index = (previous_index + 1) % ladder_len;
        let command = self.sequencer.issue(PlayerAction::SetRate {
            rate: self.rate(),
            correct_pitch: self.config.correct_pitch,
        });
        self.pending_rate = Some(PendingRate {
            seq: command.seq,
            previous_index,
        });
        debug!(rate = self.rate(), "playback rate changed");
        vec![command]
    }

    /// Flips looping. Purely local; the player is not involved.
    pub fn toggle_loop(&mut self) -> bool {
        self.looping = !self.looping;
        debug!(looping = self.looping, "looping toggled");
        self.looping
    }

    /// Pauses the player and stops reacting to anything afterwards.
    pub fn teardown(&mut self) -> Vec<PlayerCommand> {
        if self.phase == PlaybackPhase::Closed {
            return Vec::new();
        }

        let pause = self.sequencer.issue(PlayerAction::Pause);
        self.phase = PlaybackPhase::Closed;
        self.pending_pause = None;
        self.pending_play = None;
        self.pending_rate = None;
        self.seeks.clear();
        info!(position_ms = self.position_ms, "playback torn down");
        vec![pause]
    }

    /// Rolls back optimistic state for a rejected command.
    ///
    /// Returns false when `seq` belongs to a command that has since been
    /// superseded, or after teardown.
    pub fn command_failed(&mut self, seq: CommandSeq) -> bool {
        if self.phase == PlaybackPhase::Closed {
            debug!(seq, "ignoring command failure after teardown");
            return false;
        }

        if let Some(play) = self.pending_play.filter(|play| play.seq == seq) {
            self.pending_play = None;
            self.phase = play.previous;
            warn!(seq, phase = ?self.phase, "play failed; reverting");
            return true;
        }

        if self.pending_pause == Some(seq) {
            self.pending_pause = None;
            warn!(seq, "pause failed; next status decides play state");
            return true;
        }

        if let Some(rate) = self.pending_rate.filter(|rate| rate.seq == seq) {
            self.pending_rate = None;
            self.rate_index = rate.previous_index;
            warn!(seq, rate = self.rate(), "rate change failed; reverting");
            return true;
        }

        if self.seeks.failed(seq) {
            self.unconfirmed = 0;
            match self.phase {
                PlaybackPhase::Seeking { resume: false, .. } => {
                    warn!(seq, "initial seek failed; trusting reported positions");
                    self.phase = PlaybackPhase::Ready;
                }
                PlaybackPhase::Seeking { resume: true, .. } => {
                    warn!(seq, "restart seek failed; continuing playback");
                    self.phase = PlaybackPhase::Playing;
                }
                _ => warn!(seq, "boundary seek failed"),
            }
            return true;
        }

        debug!(seq, "ignoring failure of superseded command");
        false
    }

    fn begin_initialization(&mut self, status: PlayerStatus) -> Vec<PlayerCommand> {
        if !status.is_loaded {
            return Vec::new();
        }

        let target_ms = self.range.start_ms;
        let pause = self.sequencer.issue(PlayerAction::Pause);
        self.pending_pause = Some(pause.seq);
        let seek = self.issue_seek_to_start();
        self.phase = PlaybackPhase::Seeking {
            target_ms,
            resume: false,
        };
        info!(
            target_ms,
            reported_ms = status.position_millis,
            "playback initialization started"
        );
        vec![pause, seek]
    }

    fn await_seek(
        &mut self,
        status: PlayerStatus,
        target_ms: u64,
        resume: bool,
    ) -> Vec<PlayerCommand> {
        if !status.is_loaded {
            return Vec::new();
        }

        if self.seeks.confirms(status.position_millis, target_ms) {
            self.seeks.clear();
            self.unconfirmed = 0;
            self.position_ms = status.position_millis;
            if status.is_playing {
                self.pending_play = None;
            } else {
                self.pending_pause = None;
            }
            self.phase = if resume {
                PlaybackPhase::Playing
            } else {
                PlaybackPhase::Ready
            };
            info!(
                target_ms,
                position_ms = self.position_ms,
                phase = ?self.phase,
                "seek confirmed"
            );
            return Vec::new();
        }

        if !resume {
            debug!(
                reported_ms = status.position_millis,
                target_ms, "notification ignored until initial seek is confirmed"
            );
            return Vec::new();
        }

        self.unconfirmed += 1;
        if self.unconfirmed < self.config.stale_notification_budget {
            return Vec::new();
        }

        warn!(
            reported_ms = status.position_millis,
            target_ms, "restart seek unconfirmed; resuming from reported position"
        );
        self.seeks.clear();
        self.unconfirmed = 0;
        self.phase = PlaybackPhase::Playing;
        self.apply_status(status)
    }

    fn apply_status(&mut self, status: PlayerStatus) -> Vec<PlayerCommand> {
        if !status.is_loaded {
            return Vec::new();
        }

        let was_playing = self.phase == PlaybackPhase::Playing;
        if status.is_playing {
            self.pending_play = None;
        } else {
            self.pending_pause = None;
        }
        let playing = match (self.pending_pause, self.pending_play) {
            (Some(_), _) => false,
            (None, Some(_)) => true,
            (None, None) => status.is_playing,
        };
        self.phase = match (self.phase, playing) {
            (_, true) => PlaybackPhase::Playing,
            (PlaybackPhase::Ready, false) => PlaybackPhase::Ready,
            (_, false) => PlaybackPhase::Paused,
        };

        let position_ms = status.position_millis;
        self.seeks.observe(position_ms, self.range);
        if was_playing && !playing && self.looping && position_ms >= self.range.end_ms {
            return self.replay_after_media_end(position_ms);
        }

        let policy = BoundaryPolicy::from_looping(self.looping);
        match boundary_action(position_ms, self.range, playing, policy) {
            BoundaryAction::Accept => {
                self.position_ms = position_ms;
                Vec::new()
            }
            BoundaryAction::SeekToStart => {
                let start_ms = self.range.start_ms;
                self.position_ms = start_ms;
                if !self.seeks.should_issue(start_ms) {
                    debug!(position_ms, "boundary seek already in flight");
                    return Vec::new();
                }
                debug!(position_ms, start_ms, "position outside range; seeking to start");
                vec![self.issue_seek_to_start()]
            }
            BoundaryAction::Pause => {
                self.position_ms = position_ms;
                info!(position_ms, end_ms = self.range.end_ms, "range end reached");
                vec![self.issue_pause()]
            }
        }
    }

    /// The player stopped on its own at the end of the media, which happens
    /// whenever the range ends where the clip does.
    fn replay_after_media_end(&mut self, position_ms: u64) -> Vec<PlayerCommand> {
        let start_ms = self.range.start_ms;
        let mut commands = Vec::with_capacity(2);
        if self.seeks.should_issue(start_ms) {
            commands.push(self.issue_seek_to_start());
        } else {
            self.position_ms = start_ms;
        }

        let play = self.sequencer.issue(PlayerAction::Play);
        self.pending_play = Some(OptimisticPlay {
            seq: play.seq,
            previous: PlaybackPhase::Paused,
        });
        self.phase = PlaybackPhase::Playing;
        info!(position_ms, start_ms, "player stopped at media end; looping");
        commands.push(play);
        commands
    }

    fn issue_seek_to_start(&mut self) -> PlayerCommand {
        let start_ms = self.range.start_ms;
        let seek = self.sequencer.issue(PlayerAction::SeekTo {
            position_ms: start_ms,
        });
        self.seeks.issued(start_ms, seek.seq);
        self.position_ms = start_ms;
        seek
    }

    fn issue_pause(&mut self) -> PlayerCommand {
        let pause = self.sequencer.issue(PlayerAction::Pause);
        self.pending_pause = Some(pause.seq);
        self.pending_play = None;
        self.phase = PlaybackPhase::Paused;
        pause
    }

    fn accepts_commands(&self, command: &'static str) -> bool {
        if self.is_initialized() {
            return true;
        }
        debug!(command, phase = ?self.phase, "command ignored before initialization");
        false
    }
}
