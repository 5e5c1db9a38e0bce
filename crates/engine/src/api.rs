use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::playback::{PlaybackController, PlaybackSnapshot};
use crate::player::{CommandKind, CommandSeq, CommandSequencer, PlayerCommand, PlayerStatus};
use crate::preview::TrimPreview;
use crate::session::{PlaybackParams, Stage, StageFlow, TrimParams, TrimRange, TrimSession};
use crate::slider::{Handle, RangeSlider};

/// Commands accepted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Selection → trim with a picked video.
    SelectVideo(TrimParams),
    /// Enters playback straight from a trim → playback payload.
    OpenPlayback(PlaybackParams),
    BackToSelect,
    SetTrackWidth {
        width_px: f32,
    },
    BeginDrag {
        handle: Handle,
    },
    /// Moves a handle by `dx_px`, cumulative since its gesture began.
    Drag {
        handle: Handle,
        dx_px: f32,
    },
    /// Moves both handles in one update cycle.
    DragBoth {
        start_dx_px: f32,
        end_dx_px: f32,
    },
    EndDrag {
        handle: Handle,
    },
    TogglePreview,
    ConfirmTrim,
    EditTrim,
    Play,
    Pause,
    TogglePlay,
    Restart,
    CycleRate,
    ToggleLoop,
    PlayerStatus(PlayerStatus),
    PlayerCommandFailed {
        seq: CommandSeq,
        kind: CommandKind,
        reason: String,
    },
    /// The screen lost focus or is being left. Pauses and closes the
    /// active player driver.
    Teardown,
    /// Re-creates the driver for the current stage after a teardown.
    Resume,
}

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StageChanged(StageSummary),
    RangeChanged(TrimRange),
    PreviewChanged { position_ms: u64, playing: bool },
    PlaybackChanged(PlaybackSnapshot),
    /// A command the host must run against its player, in order.
    Player(PlayerCommand),
    Notice(UserNotice),
}

/// Stage information for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageSummary {
    Select,
    Trim {
        uri: String,
        duration_ms: u64,
        duration_known: bool,
    },
    Playback {
        session: TrimSession,
    },
}

/// Category of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    InvalidRange,
    MissingVideo,
    DegenerateDuration,
    PlayerFailure,
    Other,
}

/// What the notice offers besides being dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeAction {
    Dismiss,
    Retry,
    NavigateBack,
}

/// Dismissible message shown for every recoverable failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotice {
    pub kind: NoticeKind,
    pub message: String,
    pub action: NoticeAction,
}

impl UserNotice {
    pub fn from_error(error: &EngineError) -> Self {
        let (kind, action) = match error {
            EngineError::InvalidRange { .. }
            | EngineError::GapTooSmall { .. }
            | EngineError::RangeOutOfBounds { .. } => {
                (NoticeKind::InvalidRange, NoticeAction::Dismiss)
            }
            EngineError::MissingVideoUri => {
                (NoticeKind::MissingVideo, NoticeAction::NavigateBack)
            }
            EngineError::DegenerateDuration { .. } => {
                (NoticeKind::DegenerateDuration, NoticeAction::NavigateBack)
            }
            EngineError::PlayerCommand { .. } => (NoticeKind::PlayerFailure, NoticeAction::Retry),
            _ => (NoticeKind::Other, NoticeAction::Dismiss),
        };

        Self {
            kind,
            message: error.to_string(),
            action,
        }
    }
}

/// Screen-flow engine: stage coordinator, slider, preview and playback.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    flow: StageFlow,
    slider: Option<RangeSlider>,
    preview: Option<TrimPreview>,
    playback: Option<PlaybackController>,
    track_width_px: f32,
    next_seq: CommandSeq,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            flow: StageFlow::new(),
            slider: None,
            preview: None,
            playback: None,
            track_width_px: 0.0,
            next_seq: 1,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stage(&self) -> &Stage {
        self.flow.stage()
    }

    pub fn slider(&self) -> Option<&RangeSlider> {
        self.slider.as_ref()
    }

    pub fn preview(&self) -> Option<&TrimPreview> {
        self.preview.as_ref()
    }

    pub fn playback(&self) -> Option<&PlaybackController> {
        self.playback.as_ref()
    }

    /// Applies one command and returns emitted events.
    ///
    /// Validation failures are returned as errors and leave the current
    /// stage untouched. A missing video is not an error here: it pauses the
    /// player, redirects to selection and is reported as [`Event::Notice`],
    /// like player failures.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Event>> {
        let events = match command {
            Command::SelectVideo(params) => self.select_video(params),
            Command::OpenPlayback(params) => self.open_playback(params),
            Command::BackToSelect => self.back_to_select(),
            Command::SetTrackWidth { width_px } => {
                self.track_width_px = width_px;
                if let Some(slider) = self.slider.as_mut() {
                    slider.set_width(width_px);
                }
                Ok(Vec::new())
            }
            Command::BeginDrag { handle } => {
                if let Some(slider) = self.slider.as_mut() {
                    slider.begin_drag(handle);
                }
                Ok(Vec::new())
            }
            Command::Drag { handle, dx_px } => {
                self.apply_drag(|slider| slider.drag(handle, dx_px))
            }
            Command::DragBoth {
                start_dx_px,
                end_dx_px,
            } => self.apply_drag(|slider| slider.drag_both(start_dx_px, end_dx_px)),
            Command::EndDrag { handle } => {
                if let Some(slider) = self.slider.as_mut() {
                    slider.end_drag(handle);
                }
                Ok(Vec::new())
            }
            Command::TogglePreview => Ok(self.with_preview(TrimPreview::toggle_play)),
            Command::ConfirmTrim => self.confirm_trim(),
            Command::EditTrim => self.edit_trim(),
            Command::Play => Ok(self.with_playback(PlaybackController::play)),
            Command::Pause => Ok(self.with_playback(PlaybackController::pause)),
            Command::TogglePlay => Ok(self.with_playback(PlaybackController::toggle_play)),
            Command::Restart => Ok(self.with_playback(PlaybackController::restart)),
            Command::CycleRate => Ok(self.with_playback(PlaybackController::cycle_rate)),
            Command::ToggleLoop => Ok(self.with_playback(|playback| {
                playback.toggle_loop();
                Vec::new()
            })),
            Command::PlayerStatus(status) => Ok(self.player_status(status)),
            Command::PlayerCommandFailed { seq, kind, reason } => {
                Ok(self.player_command_failed(seq, kind, reason))
            }
            Command::Teardown => Ok(self.suspend()),
            Command::Resume => Ok(self.resume()),
        };

        let events = match events {
            Err(EngineError::MissingVideoUri) => {
                Ok(self.redirected_to_select(&EngineError::MissingVideoUri))
            }
            other => other,
        };
        self.remember_seq();
        events
    }

    fn select_video(&mut self, params: TrimParams) -> Result<Vec<Event>> {
        let stage = self.flow.select(params)?.clone();
        let mut events = self.teardown_players();
        events.extend(self.enter_trim(&stage));
        Ok(events)
    }

    fn open_playback(&mut self, params: PlaybackParams) -> Result<Vec<Event>> {
        let session = self.flow.open_playback(params)?;
        let mut events = self.teardown_players();
        events.extend(self.enter_playback(session));
        Ok(events)
    }

    fn back_to_select(&mut self) -> Result<Vec<Event>> {
        let mut events = self.teardown_players();
        self.flow.redirect_to_select();
        self.slider = None;
        events.push(Event::StageChanged(StageSummary::Select));
        Ok(events)
    }

    fn confirm_trim(&mut self) -> Result<Vec<Event>> {
        let session = self.flow.confirm_trim()?;
        let mut events = self.teardown_players();
        events.extend(self.enter_playback(session));
        Ok(events)
    }

    fn edit_trim(&mut self) -> Result<Vec<Event>> {
        self.flow.edit_trim()?;
        let mut events = self.teardown_players();
        let stage = self.flow.stage().clone();
        events.extend(self.enter_trim(&stage));
        Ok(events)
    }

    fn enter_trim(&mut self, stage: &Stage) -> Vec<Event> {
        let Stage::Trim { asset, range } = stage else {
            return Vec::new();
        };

        let mut slider = RangeSlider::new(asset.duration_ms, *range, self.config.slider.clone());
        slider.set_width(self.track_width_px);
        self.slider = Some(slider);
        self.preview = Some(TrimPreview::new(
            *range,
            &self.config.playback,
            self.sequencer(),
        ));
        info!(uri = %asset.uri, start_ms = range.start_ms, end_ms = range.end_ms, "trim stage entered");

        let mut events = vec![
            Event::StageChanged(StageSummary::Trim {
                uri: asset.uri.clone(),
                duration_ms: asset.duration_ms,
                duration_known: !asset.is_degenerate(),
            }),
            Event::RangeChanged(*range),
        ];
        if asset.is_degenerate() {
            events.push(Event::Notice(UserNotice::from_error(
                &EngineError::DegenerateDuration {
                    duration_ms: asset.duration_ms,
                },
            )));
        }
        events
    }

    fn enter_playback(&mut self, session: TrimSession) -> Vec<Event> {
        self.slider = None;
        let controller = PlaybackController::with_sequencer(
            session.range,
            self.config.playback.clone(),
            self.sequencer(),
        );
        let snapshot = controller.snapshot();
        self.playback = Some(controller);
        info!(
            uri = %session.asset.uri,
            start_ms = session.range.start_ms,
            end_ms = session.range.end_ms,
            "playback stage entered"
        );

        vec![
            Event::StageChanged(StageSummary::Playback { session }),
            Event::PlaybackChanged(snapshot),
        ]
    }

    fn apply_drag(
        &mut self,
        drag: impl FnOnce(&mut RangeSlider) -> Option<TrimRange>,
    ) -> Result<Vec<Event>> {
        let Some(slider) = self.slider.as_mut() else {
            return Ok(Vec::new());
        };
        let Some(range) = drag(slider) else {
            return Ok(Vec::new());
        };

        self.flow.update_range(range)?;
        let mut events = vec![Event::RangeChanged(range)];
        if let Some(preview) = self.preview.as_mut() {
            events.extend(preview.set_range(range).into_iter().map(Event::Player));
            events.push(Event::PreviewChanged {
                position_ms: preview.position_ms(),
                playing: preview.is_playing(),
            });
        }
        Ok(events)
    }

    fn player_status(&mut self, status: PlayerStatus) -> Vec<Event> {
        if self.playback.is_some() {
            return self.with_playback(|playback| playback.on_status(status));
        }
        self.with_preview(|preview| preview.on_status(status))
    }

    fn player_command_failed(
        &mut self,
        seq: CommandSeq,
        kind: CommandKind,
        reason: String,
    ) -> Vec<Event> {
        let applied = match (self.playback.as_mut(), self.preview.as_mut()) {
            (Some(playback), _) => playback.command_failed(seq),
            (None, Some(preview)) => preview.command_failed(seq),
            (None, None) => false,
        };
        debug!(seq, %kind, applied, "player command failure routed");

        let mut events = Vec::new();
        if let Some(playback) = self.playback.as_ref() {
            events.push(Event::PlaybackChanged(playback.snapshot()));
        }
        events.push(Event::Notice(UserNotice::from_error(
            &EngineError::PlayerCommand { kind, reason },
        )));
        events
    }

    fn with_playback(
        &mut self,
        apply: impl FnOnce(&mut PlaybackController) -> Vec<PlayerCommand>,
    ) -> Vec<Event> {
        let Some(playback) = self.playback.as_mut() else {
            return Vec::new();
        };
        let mut events: Vec<Event> = apply(playback).into_iter().map(Event::Player).collect();
        events.push(Event::PlaybackChanged(playback.snapshot()));
        events
    }

    fn with_preview(
        &mut self,
        apply: impl FnOnce(&mut TrimPreview) -> Vec<PlayerCommand>,
    ) -> Vec<Event> {
        let Some(preview) = self.preview.as_mut() else {
            return Vec::new();
        };
        let mut events: Vec<Event> = apply(preview).into_iter().map(Event::Player).collect();
        events.push(Event::PreviewChanged {
            position_ms: preview.position_ms(),
            playing: preview.is_playing(),
        });
        events
    }

    /// Pauses and drops whichever player driver is active.
    fn teardown_players(&mut self) -> Vec<Event> {
        let mut commands = Vec::new();
        if let Some(mut preview) = self.preview.take() {
            commands.extend(preview.teardown());
            self.bump_seq(preview.next_seq());
        }
        if let Some(mut playback) = self.playback.take() {
            commands.extend(playback.teardown());
            self.bump_seq(playback.next_seq());
        }
        commands.into_iter().map(Event::Player).collect()
    }

    /// Pauses the player of a flow that was sent back to selection.
    fn redirected_to_select(&mut self, error: &EngineError) -> Vec<Event> {
        warn!(%error, "redirecting to selection");
        let mut events = self.teardown_players();
        self.flow.redirect_to_select();
        self.slider = None;
        events.push(Event::StageChanged(StageSummary::Select));
        events.push(Event::Notice(UserNotice::from_error(error)));
        events
    }

    /// Closes the active driver but keeps the stage, reporting its final
    /// state so views stop showing it as playing.
    fn suspend(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if let Some(preview) = self.preview.as_mut() {
            events.extend(preview.teardown().into_iter().map(Event::Player));
            events.push(Event::PreviewChanged {
                position_ms: preview.position_ms(),
                playing: preview.is_playing(),
            });
        }
        if let Some(playback) = self.playback.as_mut() {
            events.extend(playback.teardown().into_iter().map(Event::Player));
            events.push(Event::PlaybackChanged(playback.snapshot()));
        }
        events.extend(self.teardown_players());
        events
    }

    fn resume(&mut self) -> Vec<Event> {
        if self.preview.is_some() || self.playback.is_some() {
            return Vec::new();
        }

        match self.flow.stage().clone() {
            Stage::Select => Vec::new(),
            Stage::Trim { range, .. } => {
                let preview = TrimPreview::new(range, &self.config.playback, self.sequencer());
                let event = Event::PreviewChanged {
                    position_ms: preview.position_ms(),
                    playing: preview.is_playing(),
                };
                self.preview = Some(preview);
                debug!("trim preview resumed");
                vec![event]
            }
            Stage::Playback { session } => self.enter_playback(session),
        }
    }

    fn sequencer(&self) -> CommandSequencer {
        CommandSequencer::starting_at(self.next_seq)
    }

    fn remember_seq(&mut self) {
        let preview_seq = self.preview.as_ref().map(TrimPreview::next_seq);
        let playback_seq = self.playback.as_ref().map(PlaybackController::next_seq);
        for seq in [preview_seq, playback_seq].into_iter().flatten() {
            self.bump_seq(seq);
        }
    }

    fn bump_seq(&mut self, seq: CommandSeq) {
        self.next_seq = self.next_seq.max(seq);
    }
}
