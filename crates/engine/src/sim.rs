//! In-process player used by the desktop app, the CLI and tests.

use std::collections::HashSet;

use crate::error::{EngineError, Result};
use crate::player::{CommandKind, Player, PlayerAction, PlayerStatus};

/// Clock-driven stand-in for a device video player.
///
/// Like real players it starts playing from `0` as soon as it is loaded and
/// stops by itself at the end of the media.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    duration_ms: u64,
    position_ms: f64,
    playing: bool,
    rate: f32,
    fail_next: HashSet<CommandKind>,
    accepted: Vec<PlayerAction>,
}

impl SimulatedPlayer {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            position_ms: 0.0,
            playing: true,
            rate: 1.0,
            fail_next: HashSet::new(),
            accepted: Vec::new(),
        }
    }

    /// Makes the next command of `kind` fail once.
    pub fn fail_next(&mut self, kind: CommandKind) {
        self.fail_next.insert(kind);
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms.round() as u64
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Actions the player accepted, in order.
    pub fn accepted(&self) -> &[PlayerAction] {
        &self.accepted
    }

    /// Advances the clock and returns the status notification for this tick.
    pub fn tick(&mut self, elapsed_ms: u64) -> PlayerStatus {
        if self.playing {
            self.position_ms += elapsed_ms as f64 * f64::from(self.rate);
            if self.position_ms >= self.duration_ms as f64 {
                self.position_ms = self.duration_ms as f64;
                self.playing = false;
            }
        }

        PlayerStatus {
            is_loaded: true,
            position_millis: self.position_ms(),
            is_playing: self.playing,
        }
    }

    fn accept(&mut self, action: PlayerAction) -> Result<()> {
        if self.fail_next.remove(&action.kind()) {
            return Err(EngineError::PlayerCommand {
                kind: action.kind(),
                reason: String::from("simulated failure"),
            });
        }
        self.accepted.push(action);
        Ok(())
    }
}

impl Player for SimulatedPlayer {
    fn play(&mut self) -> Result<()> {
        self.accept(PlayerAction::Play)?;
        self.playing = self.position_ms() < self.duration_ms;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.accept(PlayerAction::Pause)?;
        self.playing = false;
        Ok(())
    }

    fn seek_to(&mut self, position_ms: u64) -> Result<()> {
        self.accept(PlayerAction::SeekTo { position_ms })?;
        self.position_ms = position_ms.min(self.duration_ms) as f64;
        Ok(())
    }

    fn set_rate(&mut self, rate: f32, correct_pitch: bool) -> Result<()> {
        self.accept(PlayerAction::SetRate {
            rate,
            correct_pitch,
        })?;
        self.rate = rate;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SimulatedPlayer;
    use crate::player::{CommandKind, Player};

    #[test]
    fn autoplays_from_zero_and_stops_at_end() {
        let mut player = SimulatedPlayer::new(100);

        assert_eq!(player.tick(60).position_millis, 60);
        let status = player.tick(60);
        assert_eq!(status.position_millis, 100);
        assert!(!status.is_playing);
    }

    #[test]
    fn rate_scales_clock() {
        let mut player = SimulatedPlayer::new(10_000);
        player.set_rate(2.0, true).expect("set rate");

        assert_eq!(player.tick(50).position_millis, 100);
    }

    #[test]
    fn injected_failure_leaves_state_untouched() {
        let mut player = SimulatedPlayer::new(10_000);
        player.fail_next(CommandKind::Pause);

        assert!(player.pause().is_err());
        assert!(player.is_playing());
        assert!(player.pause().is_ok());
        assert!(!player.is_playing());
    }
}
