use std::time::{Duration, Instant};

use engine::time::{format_rate, format_seconds};
use engine::{
    Command, Engine, EngineConfig, Event, Handle, NoticeAction, PlaybackSnapshot, PlayerCommand,
    PlayerHost, SimulatedPlayer, StageSummary, TrimParams, TrimRange, UserNotice, format_clock,
};
use iced::widget::{button, column, row, text, text_input};
use iced::{Element, Subscription, Task, event, window};
use tracing::{debug, warn};

use crate::widgets::range_slider::{self, SliderMessages};

/// Interval between simulated player status notifications.
pub const TICK_MS: u64 = 50;

/// UI messages handled by the iced app update loop.
#[derive(Debug, Clone)]
pub enum Message {
    UriChanged(String),
    DurationChanged(String),
    SelectPressed,
    SliderResized(f32),
    HandlePressed(Handle),
    HandleDragged(Handle, f32),
    HandleReleased(Handle),
    PreviewToggled,
    ConfirmPressed,
    EditPressed,
    BackPressed,
    PlayToggled,
    RestartPressed,
    RatePressed,
    LoopToggled,
    Tick(Instant),
    WindowUnfocused,
    WindowFocused,
    NoticeDismissed,
    NoticeActionPressed,
}

/// Root UI state. Owns the engine and the only player handle.
pub struct App {
    engine: Engine,
    host: PlayerHost<SimulatedPlayer>,
    uri_input: String,
    duration_input: String,
    stage: StageSummary,
    range: Option<TrimRange>,
    preview_position_ms: u64,
    preview_playing: bool,
    playback: Option<PlaybackSnapshot>,
    notice: Option<UserNotice>,
    retry: Option<Command>,
    last_action: Option<Command>,
}

impl App {
    pub fn boot() -> (Self, Task<Message>) {
        (Self::new(EngineConfig::default()), Task::none())
    }

    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: Engine::new(config),
            host: PlayerHost::new(SimulatedPlayer::new(0)),
            uri_input: String::new(),
            duration_input: String::new(),
            stage: StageSummary::Select,
            range: None,
            preview_position_ms: 0,
            preview_playing: false,
            playback: None,
            notice: None,
            retry: None,
            last_action: None,
        }
    }

    /// Handles one UI message.
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::UriChanged(uri) => self.uri_input = uri,
            Message::DurationChanged(duration) => self.duration_input = duration,
            Message::SelectPressed => self.select(),
            Message::SliderResized(width_px) => self.send(Command::SetTrackWidth { width_px }),
            Message::HandlePressed(handle) => self.send(Command::BeginDrag { handle }),
            Message::HandleDragged(handle, dx_px) => self.send(Command::Drag { handle, dx_px }),
            Message::HandleReleased(handle) => self.send(Command::EndDrag { handle }),
            Message::PreviewToggled => self.act(Command::TogglePreview),
            Message::ConfirmPressed => self.act(Command::ConfirmTrim),
            Message::EditPressed => self.act(Command::EditTrim),
            Message::BackPressed => self.act(Command::BackToSelect),
            Message::PlayToggled => self.act(Command::TogglePlay),
            Message::RestartPressed => self.act(Command::Restart),
            Message::RatePressed => self.act(Command::CycleRate),
            Message::LoopToggled => self.act(Command::ToggleLoop),
            Message::Tick(_) => self.tick(),
            Message::WindowUnfocused => self.send(Command::Teardown),
            Message::WindowFocused => self.send(Command::Resume),
            Message::NoticeDismissed => {
                self.notice = None;
                self.retry = None;
            }
            Message::NoticeActionPressed => self.notice_action(),
        }

        Task::none()
    }

    /// Drives the simulated player clock while a video is on screen and
    /// pauses the player whenever the window loses focus.
    pub fn subscription(&self) -> Subscription<Message> {
        let focus = event::listen_with(focus_message);
        if matches!(self.stage, StageSummary::Select) {
            return focus;
        }
        Subscription::batch([
            focus,
            iced::time::every(Duration::from_millis(TICK_MS)).map(Message::Tick),
        ])
    }

    fn select(&mut self) {
        let uri = self.uri_input.trim();
        let video_duration = self.duration_input.trim().parse::<u64>().ok();
        let params = TrimParams {
            video_uri: (!uri.is_empty()).then(|| uri.to_owned()),
            video_duration,
        };
        self.host = PlayerHost::new(SimulatedPlayer::new(video_duration.unwrap_or(0)));
        self.act(Command::SelectVideo(params));
    }

    fn tick(&mut self) {
        if matches!(self.stage, StageSummary::Select) {
            return;
        }
        let status = self.host.player_mut().tick(TICK_MS);
        self.send(Command::PlayerStatus(status));
    }

    fn notice_action(&mut self) {
        let Some(notice) = self.notice.take() else {
            return;
        };
        match notice.action {
            NoticeAction::Dismiss => {}
            NoticeAction::Retry => {
                if let Some(command) = self.retry.take() {
                    debug!(?command, "retrying after player failure");
                    self.act(command);
                }
            }
            NoticeAction::NavigateBack => self.act(Command::BackToSelect),
        }
    }

    /// Sends a user-initiated command, remembering it for retries.
    fn act(&mut self, command: Command) {
        self.last_action = Some(command.clone());
        self.send(command);
    }

    fn send(&mut self, command: Command) {
        match self.engine.handle_command(command) {
            Ok(events) => self.apply_events(events),
            Err(error) => {
                warn!(%error, "command rejected");
                if matches!(self.engine.stage(), engine::Stage::Select) {
                    self.reset_to_select();
                }
                self.notice = Some(UserNotice::from_error(&error));
            }
        }
    }

    fn apply_events(&mut self, events: Vec<Event>) {
        let mut commands: Vec<PlayerCommand> = Vec::new();
        for event in events {
            match event {
                Event::StageChanged(stage) => {
                    if matches!(stage, StageSummary::Select) {
                        self.reset_to_select();
                    }
                    if !matches!(stage, StageSummary::Playback { .. }) {
                        self.playback = None;
                    }
                    self.stage = stage;
                }
                Event::RangeChanged(range) => self.range = Some(range),
                Event::PreviewChanged {
                    position_ms,
                    playing,
                } => {
                    self.preview_position_ms = position_ms;
                    self.preview_playing = playing;
                }
                Event::PlaybackChanged(snapshot) => self.playback = Some(snapshot),
                Event::Player(command) => commands.push(command),
                Event::Notice(notice) => {
                    if notice.action == NoticeAction::Retry {
                        self.retry = self.last_action.clone();
                    }
                    self.notice = Some(notice);
                }
            }
        }

        for failure in self.host.dispatch(&commands) {
            self.send(Command::PlayerCommandFailed {
                seq: failure.seq,
                kind: failure.kind,
                reason: failure.reason,
            });
        }
    }

    fn reset_to_select(&mut self) {
        self.stage = StageSummary::Select;
        self.range = None;
        self.playback = None;
        self.preview_position_ms = 0;
        self.preview_playing = false;
    }

    /// Renders the UI tree.
    pub fn view(&self) -> Element<'_, Message> {
        let body: Element<'_, Message> = match &self.stage {
            StageSummary::Select => self.select_view(),
            StageSummary::Trim { uri, .. } => self.trim_view(uri),
            StageSummary::Playback { session } => self.playback_view(&session.asset.uri),
        };

        let mut content = column![].spacing(12).padding(16);
        if let Some(notice) = &self.notice {
            let action_label = match notice.action {
                NoticeAction::Dismiss => None,
                NoticeAction::Retry => Some("Retry"),
                NoticeAction::NavigateBack => Some("Back"),
            };
            let mut notice_row = row![text(notice.message.clone())].spacing(12);
            if let Some(label) = action_label {
                notice_row = notice_row.push(button(label).on_press(Message::NoticeActionPressed));
            }
            notice_row = notice_row.push(button("Dismiss").on_press(Message::NoticeDismissed));
            content = content.push(notice_row);
        }

        content.push(body).into()
    }

    fn select_view(&self) -> Element<'_, Message> {
        column![
            text_input("video uri", &self.uri_input).on_input(Message::UriChanged),
            text_input("duration (ms)", &self.duration_input).on_input(Message::DurationChanged),
            button("Trim").on_press(Message::SelectPressed),
        ]
        .spacing(12)
        .into()
    }

    fn trim_view<'a>(&'a self, uri: &'a str) -> Element<'a, Message> {
        let range = self.range.unwrap_or(TrimRange {
            start_ms: 0,
            end_ms: 0,
        });
        let slider: Element<'a, Message> = match self.engine.slider() {
            Some(slider) => range_slider::view(
                slider,
                Some(self.preview_position_ms),
                SliderMessages {
                    resized: Message::SliderResized,
                    pressed: Message::HandlePressed,
                    dragged: Message::HandleDragged,
                    released: Message::HandleReleased,
                },
            ),
            None => text("").into(),
        };

        column![
            text(uri),
            text(format!(
                "Preview {}",
                format_clock(self.preview_position_ms)
            )),
            slider,
            row![
                text(format!("Start {}", format_clock(range.start_ms))),
                text(format!("End {}", format_clock(range.end_ms))),
                text(format!("Length {}", format_seconds(range.len_ms()))),
            ]
            .spacing(16),
            row![
                button(if self.preview_playing { "Pause" } else { "Play" })
                    .on_press(Message::PreviewToggled),
                button("Confirm").on_press(Message::ConfirmPressed),
                button("Back").on_press(Message::BackPressed),
            ]
            .spacing(12),
        ]
        .spacing(12)
        .into()
    }

    fn playback_view<'a>(&'a self, uri: &'a str) -> Element<'a, Message> {
        let Some(snapshot) = self.playback else {
            return text(uri).into();
        };
        let ready = snapshot.initialized;
        let elapsed_ms = snapshot.position_ms.saturating_sub(snapshot.range.start_ms);

        column![
            text(uri),
            text(format!(
                "{} / {}",
                format_clock(elapsed_ms),
                format_clock(snapshot.range.len_ms())
            )),
            text(if snapshot.busy { "Loading…" } else { "" }),
            row![
                button(if snapshot.is_playing { "Pause" } else { "Play" })
                    .on_press_maybe(ready.then_some(Message::PlayToggled)),
                button("Restart").on_press_maybe(ready.then_some(Message::RestartPressed)),
                button(text(format_rate(snapshot.rate)))
                    .on_press_maybe(ready.then_some(Message::RatePressed)),
                button(if snapshot.looping { "Loop: on" } else { "Loop: off" })
                    .on_press(Message::LoopToggled),
            ]
            .spacing(12),
            row![
                button("Edit trim").on_press(Message::EditPressed),
                button("Back").on_press(Message::BackPressed),
            ]
            .spacing(12),
        ]
        .spacing(12)
        .into()
    }
}

fn focus_message(
    event: iced::Event,
    _status: event::Status,
    _window: window::Id,
) -> Option<Message> {
    match event {
        iced::Event::Window(window::Event::Unfocused | window::Event::CloseRequested) => {
            Some(Message::WindowUnfocused)
        }
        iced::Event::Window(window::Event::Focused) => Some(Message::WindowFocused),
        _ => None,
    }
}
