//! End-to-end runs of the engine against the simulated player.

use engine::{
    Command, CommandKind, Engine, EngineConfig, Event, Handle, NoticeAction, NoticeKind,
    PlaybackParams, PlaybackPhase, Player, PlayerHost, SimulatedPlayer, TrimParams, UserNotice,
};

const TICK_MS: u64 = 50;

struct Harness {
    engine: Engine,
    host: PlayerHost<SimulatedPlayer>,
    notices: Vec<UserNotice>,
}

impl Harness {
    fn new(duration_ms: u64) -> Self {
        Self {
            engine: Engine::new(EngineConfig::default()),
            host: PlayerHost::new(SimulatedPlayer::new(duration_ms)),
            notices: Vec::new(),
        }
    }

    fn playback(duration_ms: u64, start_ms: u64, end_ms: u64) -> Self {
        let mut harness = Self::new(duration_ms);
        harness.send(Command::OpenPlayback(PlaybackParams {
            video_uri: Some("file:///clip.mp4".to_owned()),
            start_time: start_ms,
            end_time: end_ms,
            original_duration: duration_ms,
            trimmed_duration: end_ms - start_ms,
        }));
        harness
    }

    /// Runs a command and every player command it produces, feeding
    /// failures back into the engine.
    fn send(&mut self, command: Command) {
        let events = self
            .engine
            .handle_command(command)
            .expect("command should succeed");
        self.run(events);
    }

    fn run(&mut self, events: Vec<Event>) {
        let mut commands = Vec::new();
        for event in events {
            match event {
                Event::Player(command) => commands.push(command),
                Event::Notice(notice) => self.notices.push(notice),
                _ => {}
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

    fn tick(&mut self) {
        let status = self.host.player_mut().tick(TICK_MS);
        self.send(Command::PlayerStatus(status));
    }

    fn ticks(&mut self, count: usize) {
        for _ in 0..count {
            self.tick();
        }
    }

    fn phase(&self) -> PlaybackPhase {
        self.engine.playback().expect("playback stage").phase()
    }
}

#[test]
fn initialization_pauses_autoplay_and_parks_at_start() {
    let mut harness = Harness::playback(10_000, 2_000, 5_000);

    harness.ticks(2);

    assert_eq!(harness.phase(), PlaybackPhase::Ready);
    assert!(!harness.host.player().is_playing());
    assert_eq!(harness.host.player().position_ms(), 2_000);
}

#[test]
fn looping_playback_stays_inside_range() {
    let mut harness = Harness::playback(10_000, 2_000, 5_000);
    harness.ticks(2);
    harness.send(Command::Play);

    for _ in 0..400 {
        harness.tick();
        let position_ms = harness.host.player().position_ms();
        assert!(
            (2_000..5_000 + TICK_MS).contains(&position_ms),
            "player escaped the range at {position_ms}"
        );
    }
    assert!(harness.host.player().is_playing());
    assert_eq!(harness.phase(), PlaybackPhase::Playing);
}

#[test]
fn looping_survives_player_stopping_at_clip_end() {
    let mut harness = Harness::playback(3_000, 1_000, 3_000);
    harness.ticks(2);
    harness.send(Command::Play);

    for _ in 0..200 {
        harness.tick();
        assert_eq!(harness.phase(), PlaybackPhase::Playing);
        let position_ms = harness.host.player().position_ms();
        assert!(
            (1_000..3_000).contains(&position_ms),
            "player parked at {position_ms}"
        );
    }
    assert!(harness.host.player().is_playing());
}

#[test]
fn trim_preview_loops_over_the_whole_clip() {
    let mut harness = Harness::new(2_000);
    harness.send(Command::SelectVideo(TrimParams {
        video_uri: Some("file:///clip.mp4".to_owned()),
        video_duration: Some(2_000),
    }));

    harness.ticks(120);

    assert!(harness.host.player().is_playing());
    assert!(harness.engine.preview().expect("preview").is_playing());
}

#[test]
fn missing_video_redirect_pauses_running_playback() {
    let mut harness = Harness::playback(10_000, 2_000, 5_000);
    harness.ticks(2);
    harness.send(Command::Play);
    harness.ticks(3);
    assert!(harness.host.player().is_playing());

    harness.send(Command::SelectVideo(TrimParams {
        video_uri: None,
        video_duration: Some(10_000),
    }));

    assert!(!harness.host.player().is_playing());
    assert_eq!(harness.engine.stage().name(), "select");
    assert_eq!(
        harness.notices.last().map(|notice| notice.kind),
        Some(NoticeKind::MissingVideo)
    );
}

#[test]
fn stop_mode_pauses_at_end_and_replays_from_start() {
    let mut harness = Harness::playback(10_000, 2_000, 5_000);
    harness.ticks(2);
    harness.send(Command::ToggleLoop);
    harness.send(Command::Play);

    harness.ticks(80);
    assert!(!harness.host.player().is_playing());
    assert_eq!(harness.phase(), PlaybackPhase::Paused);
    assert!(harness.host.player().position_ms() >= 5_000);

    harness.send(Command::Play);
    assert_eq!(harness.host.player().position_ms(), 2_000);
    assert!(harness.host.player().is_playing());
}

#[test]
fn faster_rate_reaches_the_end_sooner() {
    let mut harness = Harness::playback(10_000, 0, 4_000);
    harness.ticks(2);
    harness.send(Command::ToggleLoop);
    harness.send(Command::CycleRate);
    harness.send(Command::CycleRate);
    assert_eq!(harness.host.player().rate(), 1.5);

    harness.send(Command::Play);
    harness.ticks(55);

    assert_eq!(harness.phase(), PlaybackPhase::Paused);
}

#[test]
fn failed_play_reverts_and_offers_retry() {
    let mut harness = Harness::playback(10_000, 2_000, 5_000);
    harness.ticks(2);
    harness.host.player_mut().fail_next(CommandKind::Play);

    harness.send(Command::Play);

    assert!(!harness.engine.playback().expect("playback").is_playing());
    let notice = harness.notices.last().expect("notice");
    assert_eq!(notice.action, NoticeAction::Retry);

    harness.send(Command::Play);
    harness.tick();
    assert!(harness.host.player().is_playing());
    assert_eq!(harness.phase(), PlaybackPhase::Playing);
}

#[test]
fn failed_initial_seek_still_initializes() {
    let mut harness = Harness::playback(10_000, 2_000, 5_000);
    harness.host.player_mut().fail_next(CommandKind::Seek);

    harness.tick();

    assert_eq!(harness.phase(), PlaybackPhase::Ready);
    assert_eq!(harness.notices.len(), 1);
}

#[test]
fn restart_resumes_from_range_start() {
    let mut harness = Harness::playback(10_000, 2_000, 5_000);
    harness.ticks(2);
    harness.send(Command::Play);
    harness.ticks(20);

    harness.send(Command::Restart);
    harness.tick();

    assert_eq!(harness.phase(), PlaybackPhase::Playing);
    let position_ms = harness.host.player().position_ms();
    assert!((2_000..2_000 + 2 * TICK_MS).contains(&position_ms));
}

#[test]
fn trim_then_play_then_edit_round_trip() {
    let mut harness = Harness::new(10_000);
    harness.send(Command::SetTrackWidth { width_px: 500.0 });
    harness.send(Command::SelectVideo(TrimParams {
        video_uri: Some("file:///clip.mp4".to_owned()),
        video_duration: Some(10_000),
    }));
    harness.send(Command::BeginDrag {
        handle: Handle::End,
    });
    harness.send(Command::Drag {
        handle: Handle::End,
        dx_px: -250.0,
    });
    harness.send(Command::EndDrag {
        handle: Handle::End,
    });

    harness.send(Command::ConfirmTrim);
    assert!(!harness.host.player().is_playing());
    harness.ticks(2);
    assert_eq!(harness.phase(), PlaybackPhase::Ready);

    harness.send(Command::EditTrim);
    let slider = harness.engine.slider().expect("slider");
    assert_eq!(slider.range().end_ms, 5_000);
    assert!(harness.engine.playback().is_none());
}

#[test]
fn teardown_stops_reacting_to_late_notifications() {
    let mut harness = Harness::playback(10_000, 2_000, 5_000);
    harness.ticks(2);
    harness.send(Command::Play);
    harness.send(Command::Teardown);
    assert!(!harness.host.player().is_playing());

    harness.host.player_mut().play().expect("direct play");
    let accepted = harness.host.player().accepted().len();
    harness.ticks(100);
    assert_eq!(harness.host.player().accepted().len(), accepted);
}
