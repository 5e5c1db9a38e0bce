use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::time::MIN_GAP_MS;

/// A picked video. Immutable once selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoAsset {
    pub uri: String,
    /// Reported or estimated duration. `0` means unknown.
    pub duration_ms: u64,
}

impl VideoAsset {
    /// Returns true when the duration is too short for any valid trim range.
    pub fn is_degenerate(&self) -> bool {
        self.duration_ms < MIN_GAP_MS
    }
}

/// The active `[start_ms, end_ms]` window of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl TrimRange {
    /// Range suggested for a freshly selected video: the whole clip.
    pub fn suggested(duration_ms: u64) -> Self {
        Self {
            start_ms: 0,
            end_ms: duration_ms,
        }
    }

    pub fn len_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Returns true for `start_ms <= t_ms < end_ms`.
    pub fn contains(&self, t_ms: u64) -> bool {
        self.start_ms <= t_ms && t_ms < self.end_ms
    }

    /// Checks ordering, minimum length and the video bounds, in that order.
    pub fn validate(&self, duration_ms: u64) -> Result<()> {
        if self.start_ms >= self.end_ms {
            return Err(EngineError::InvalidRange {
                start_ms: self.start_ms,
                end_ms: self.end_ms,
            });
        }
        if self.len_ms() < MIN_GAP_MS {
            return Err(EngineError::GapTooSmall {
                start_ms: self.start_ms,
                end_ms: self.end_ms,
                min_gap_ms: MIN_GAP_MS,
            });
        }
        if self.end_ms > duration_ms {
            return Err(EngineError::RangeOutOfBounds {
                end_ms: self.end_ms,
                duration_ms,
            });
        }

        Ok(())
    }
}

/// A confirmed trim, consumed read-only by the playback stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimSession {
    pub asset: VideoAsset,
    pub range: TrimRange,
}

impl TrimSession {
    pub fn trimmed_duration_ms(&self) -> u64 {
        self.range.len_ms()
    }

    /// Payload handed from the trim stage to the playback stage.
    pub fn playback_params(&self) -> PlaybackParams {
        PlaybackParams {
            video_uri: Some(self.asset.uri.clone()),
            start_time: self.range.start_ms,
            end_time: self.range.end_ms,
            original_duration: self.asset.duration_ms,
            trimmed_duration: self.trimmed_duration_ms(),
        }
    }

    /// Payload handed back from playback when the user edits the trim.
    pub fn edit_params(&self) -> TrimParams {
        TrimParams {
            video_uri: Some(self.asset.uri.clone()),
            video_duration: Some(self.asset.duration_ms),
        }
    }
}

/// Selection → trim (and playback → trim) payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimParams {
    pub video_uri: Option<String>,
    pub video_duration: Option<u64>,
}

/// Trim → playback payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackParams {
    pub video_uri: Option<String>,
    pub start_time: u64,
    pub end_time: u64,
    pub original_duration: u64,
    pub trimmed_duration: u64,
}

/// Screen the flow is currently on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Select,
    Trim { asset: VideoAsset, range: TrimRange },
    Playback { session: TrimSession },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Trim { .. } => "trim",
            Self::Playback { .. } => "playback",
        }
    }
}

/// Validates and performs select → trim → playback transitions.
#[derive(Debug, Clone)]
pub struct StageFlow {
    stage: Stage,
}

impl Default for StageFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl StageFlow {
    pub fn new() -> Self {
        Self {
            stage: Stage::Select,
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Enters the trim stage with the full clip suggested as the range.
    ///
    /// A missing `videoUri` redirects to selection and returns
    /// `MissingVideoUri`. A missing duration is treated as `0`.
    pub fn select(&mut self, params: TrimParams) -> Result<&Stage> {
        let asset = asset_from_params(params.video_uri, params.video_duration.unwrap_or(0))
            .inspect_err(|_| self.redirect_to_select())?;
        let range = TrimRange::suggested(asset.duration_ms);

        info!(
            uri = %asset.uri,
            duration_ms = asset.duration_ms,
            "video selected"
        );
        self.stage = Stage::Trim { asset, range };
        Ok(&self.stage)
    }

    /// Stores a slider-driven range on the trim stage.
    pub fn update_range(&mut self, new_range: TrimRange) -> Result<()> {
        let Stage::Trim { range, .. } = &mut self.stage else {
            return Err(self.wrong_stage("trim"));
        };
        *range = new_range;
        Ok(())
    }

    /// Validates the current range and moves to playback.
    ///
    /// Invalid ranges leave the flow on the trim stage.
    pub fn confirm_trim(&mut self) -> Result<TrimSession> {
        let Stage::Trim { asset, range } = &self.stage else {
            return Err(self.wrong_stage("trim"));
        };

        if let Err(error) = range.validate(asset.duration_ms) {
            warn!(
                start_ms = range.start_ms,
                end_ms = range.end_ms,
                duration_ms = asset.duration_ms,
                %error,
                "trim confirmation rejected"
            );
            return Err(error);
        }

        let session = TrimSession {
            asset: asset.clone(),
            range: *range,
        };
        info!(
            uri = %session.asset.uri,
            start_ms = session.range.start_ms,
            end_ms = session.range.end_ms,
            "trim confirmed"
        );
        self.stage = Stage::Playback {
            session: session.clone(),
        };
        Ok(session)
    }

    /// Opens playback directly from a trim → playback payload.
    pub fn open_playback(&mut self, params: PlaybackParams) -> Result<TrimSession> {
        let asset = asset_from_params(params.video_uri, params.original_duration)
            .inspect_err(|_| self.redirect_to_select())?;
        let range = TrimRange {
            start_ms: params.start_time,
            end_ms: params.end_time,
        };
        range.validate(asset.duration_ms)?;

        let session = TrimSession { asset, range };
        self.stage = Stage::Playback {
            session: session.clone(),
        };
        Ok(session)
    }

    /// Returns from playback to trim, keeping the range that was just played.
    pub fn edit_trim(&mut self) -> Result<TrimParams> {
        let Stage::Playback { session } = &self.stage else {
            return Err(self.wrong_stage("playback"));
        };

        let params = session.edit_params();
        let asset = session.asset.clone();
        let range = session.range;
        info!(
            start_ms = range.start_ms,
            end_ms = range.end_ms,
            "editing trim"
        );
        self.stage = Stage::Trim { asset, range };
        Ok(params)
    }

    pub fn redirect_to_select(&mut self) {
        self.stage = Stage::Select;
    }

    fn wrong_stage(&self, expected: &'static str) -> EngineError {
        EngineError::WrongStage {
            expected,
            actual: self.stage.name(),
        }
    }
}

fn asset_from_params(uri: Option<String>, duration_ms: u64) -> Result<VideoAsset> {
    let uri = uri
        .filter(|uri| !uri.trim().is_empty())
        .ok_or(EngineError::MissingVideoUri)?;
    Ok(VideoAsset { uri, duration_ms })
}

#[cfg(test)]
mod tests {
    use super::{PlaybackParams, Stage, StageFlow, TrimParams, TrimRange};
    use crate::error::EngineError;

    fn trim_params(duration: u64) -> TrimParams {
        TrimParams {
            video_uri: Some("file:///clip.mp4".to_owned()),
            video_duration: Some(duration),
        }
    }

    #[test]
    fn select_suggests_the_whole_clip() {
        let mut flow = StageFlow::new();
        let stage = flow.select(trim_params(12_000)).expect("select");

        let Stage::Trim { range, .. } = stage else {
            panic!("expected trim stage");
        };
        assert_eq!(
            *range,
            TrimRange {
                start_ms: 0,
                end_ms: 12_000
            }
        );
    }

    #[test]
    fn missing_uri_redirects_to_selection() {
        let mut flow = StageFlow::new();
        flow.select(trim_params(5_000)).expect("select");

        let result = flow.select(TrimParams {
            video_uri: None,
            video_duration: Some(5_000),
        });

        assert!(matches!(result, Err(EngineError::MissingVideoUri)));
        assert_eq!(flow.stage(), &Stage::Select);
    }

    #[test]
    fn half_second_clip_is_rejected_and_one_second_clip_accepted() {
        let mut flow = StageFlow::new();
        flow.select(trim_params(10_000)).expect("select");

        flow.update_range(TrimRange {
            start_ms: 5_000,
            end_ms: 5_500,
        })
        .expect("update");
        assert!(matches!(
            flow.confirm_trim(),
            Err(EngineError::GapTooSmall { .. })
        ));
        assert_eq!(flow.stage().name(), "trim");

        flow.update_range(TrimRange {
            start_ms: 5_000,
            end_ms: 6_000,
        })
        .expect("update");
        let session = flow.confirm_trim().expect("one second is enough");
        assert_eq!(session.trimmed_duration_ms(), 1_000);
        assert_eq!(flow.stage().name(), "playback");
    }

    #[test]
    fn reversed_range_is_reported_as_invalid_before_gap() {
        let range = TrimRange {
            start_ms: 6_000,
            end_ms: 5_000,
        };
        assert!(matches!(
            range.validate(10_000),
            Err(EngineError::InvalidRange { .. })
        ));
    }

    #[test]
    fn range_past_duration_is_out_of_bounds() {
        let range = TrimRange {
            start_ms: 0,
            end_ms: 11_000,
        };
        assert!(matches!(
            range.validate(10_000),
            Err(EngineError::RangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn zero_duration_video_cannot_be_confirmed() {
        let mut flow = StageFlow::new();
        flow.select(TrimParams {
            video_uri: Some("file:///clip.mp4".to_owned()),
            video_duration: None,
        })
        .expect("select tolerates unknown duration");

        assert!(matches!(
            flow.confirm_trim(),
            Err(EngineError::InvalidRange { .. })
        ));
    }

    #[test]
    fn edit_restores_played_range_instead_of_defaults() {
        let mut flow = StageFlow::new();
        flow.select(trim_params(20_000)).expect("select");
        flow.update_range(TrimRange {
            start_ms: 3_000,
            end_ms: 9_000,
        })
        .expect("update");
        flow.confirm_trim().expect("confirm");

        let params = flow.edit_trim().expect("edit");

        assert_eq!(params, trim_params(20_000));
        let Stage::Trim { range, .. } = flow.stage() else {
            panic!("expected trim stage");
        };
        assert_eq!(range.start_ms, 3_000);
        assert_eq!(range.end_ms, 9_000);
    }

    #[test]
    fn playback_params_carry_trimmed_duration() {
        let mut flow = StageFlow::new();
        let session = flow
            .open_playback(PlaybackParams {
                video_uri: Some("file:///clip.mp4".to_owned()),
                start_time: 2_000,
                end_time: 5_000,
                original_duration: 10_000,
                trimmed_duration: 3_000,
            })
            .expect("open playback");

        let params = session.playback_params();
        assert_eq!(params.trimmed_duration, 3_000);
        assert_eq!(params.original_duration, 10_000);
    }

    #[test]
    fn route_payload_uses_camel_case_keys() {
        let json = serde_json::to_value(trim_params(4_000)).expect("serialize");
        assert_eq!(json["videoUri"], "file:///clip.mp4");
        assert_eq!(json["videoDuration"], 4_000);
    }

    #[test]
    fn confirm_outside_trim_stage_is_a_stage_error() {
        let mut flow = StageFlow::new();
        assert!(matches!(
            flow.confirm_trim(),
            Err(EngineError::WrongStage {
                expected: "trim",
                actual: "select"
            })
        ));
    }
}
