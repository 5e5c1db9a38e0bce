use tracing::{debug, warn};

use crate::boundary::{BoundaryAction, BoundaryPolicy, SeekGuard, boundary_action};
use crate::config::PlaybackConfig;
use crate::player::{CommandSeq, CommandSequencer, PlayerAction, PlayerCommand, PlayerStatus};
use crate::session::TrimRange;

/// Keeps the trim screen's preview inside the range while handles move.
///
/// Lighter than [`crate::playback::PlaybackController`]: no initialization
/// handshake, no rate or stop options. Reaching the end always jumps back to
/// the start.
#[derive(Debug, Clone)]
pub struct TrimPreview {
    range: TrimRange,
    position_ms: u64,
    playing: bool,
    closed: bool,
    sequencer: CommandSequencer,
    seeks: SeekGuard,
    pending_toggle: Option<PendingToggle>,
}

/// An unconfirmed play or pause and the flag to restore if it fails.
#[derive(Debug, Clone, Copy)]
struct PendingToggle {
    seq: CommandSeq,
    previous: bool,
}

impl TrimPreview {
    pub fn new(range: TrimRange, config: &PlaybackConfig, sequencer: CommandSequencer) -> Self {
        Self {
            range,
            position_ms: 0,
            playing: false,
            closed: false,
            sequencer,
            seeks: SeekGuard::new(config.stale_notification_budget, config.seek_tolerance_ms),
            pending_toggle: None,
        }
    }

    pub fn range(&self) -> TrimRange {
        self.range
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn next_seq(&self) -> CommandSeq {
        self.sequencer.peek()
    }

    /// Applies one notification from the preview player.
    ///
    /// While a play or pause is unconfirmed, reported flags that disagree
    /// with it are treated as stale.
    pub fn on_status(&mut self, status: PlayerStatus) -> Vec<PlayerCommand> {
        if self.closed || !status.is_loaded {
            return Vec::new();
        }

        let was_playing = self.playing;
        match self.pending_toggle {
            Some(_) if status.is_playing == self.playing => self.pending_toggle = None,
            Some(_) => {}
            None => self.playing = status.is_playing,
        }

        let position_ms = status.position_millis;
        self.seeks.observe(position_ms, self.range);
        if was_playing && !self.playing && position_ms >= self.range.end_ms {
            return self.replay_after_media_end(position_ms);
        }

        match boundary_action(
            position_ms,
            self.range,
            self.playing,
            BoundaryPolicy::TRIM_PREVIEW,
        ) {
            BoundaryAction::Accept => {
                self.position_ms = position_ms;
                Vec::new()
            }
            BoundaryAction::SeekToStart => self.seek_to_start_once(),
            BoundaryAction::Pause => {
                self.position_ms = position_ms;
                self.toggle_to(false)
            }
        }
    }

    /// Adopts a new range, pulling the preview back inside it if needed.
    ///
    /// A position before the new start, or past the new end, seeks to the
    /// new start.
    pub fn set_range(&mut self, range: TrimRange) -> Vec<PlayerCommand> {
        let start_moved = range.start_ms != self.range.start_ms;
        let end_moved = range.end_ms != self.range.end_ms;
        self.range = range;
        if self.closed {
            return Vec::new();
        }

        let before_start = start_moved && self.position_ms < range.start_ms;
        let after_end = end_moved && self.position_ms > range.end_ms;
        if !before_start && !after_end {
            return Vec::new();
        }

        debug!(
            position_ms = self.position_ms,
            start_ms = range.start_ms,
            end_ms = range.end_ms,
            "preview left the edited range"
        );
        self.seek_to_start_once()
    }

    pub fn toggle_play(&mut self) -> Vec<PlayerCommand> {
        if self.closed {
            return Vec::new();
        }

        self.toggle_to(!self.playing)
    }

    /// Rolls back a failed play or pause, or forgets a failed seek so the
    /// next boundary hit retries immediately.
    pub fn command_failed(&mut self, seq: CommandSeq) -> bool {
        if self.closed {
            return false;
        }

        if let Some(toggle) = self.pending_toggle.filter(|toggle| toggle.seq == seq) {
            self.pending_toggle = None;
            self.playing = toggle.previous;
            warn!(seq, playing = self.playing, "preview play/pause failed; reverting");
            return true;
        }

        self.seeks.failed(seq)
    }

    pub fn teardown(&mut self) -> Vec<PlayerCommand> {
        if self.closed {
            return Vec::new();
        }

        self.closed = true;
        self.playing = false;
        self.pending_toggle = None;
        self.seeks.clear();
        vec![self.sequencer.issue(PlayerAction::Pause)]
    }

    fn toggle_to(&mut self, playing: bool) -> Vec<PlayerCommand> {
        let action = if playing {
            PlayerAction::Play
        } else {
            PlayerAction::Pause
        };
        let command = self.sequencer.issue(action);
        self.pending_toggle = Some(PendingToggle {
            seq: command.seq,
            previous: self.playing,
        });
        self.playing = playing;
        vec![command]
    }

    /// The player stopped on its own at the end of the media.
    fn replay_after_media_end(&mut self, position_ms: u64) -> Vec<PlayerCommand> {
        debug!(position_ms, "preview player stopped at media end; looping");
        let mut commands = self.seek_to_start_once();
        commands.extend(self.toggle_to(true));
        commands
    }

    fn seek_to_start_once(&mut self) -> Vec<PlayerCommand> {
        let start_ms = self.range.start_ms;
        self.position_ms = start_ms;
        if !self.seeks.should_issue(start_ms) {
            return Vec::new();
        }

        let seek = self.sequencer.issue(PlayerAction::SeekTo {
            position_ms: start_ms,
        });
        self.seeks.issued(start_ms, seek.seq);
        vec![seek]
    }
}
