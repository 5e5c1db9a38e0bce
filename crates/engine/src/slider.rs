//! Dual-handle range slider mapping horizontal drags to a clamped trim range.
//!
//! One coordinator owns both handle values so each handle's clamp always
//! sees the other handle's current position. Gaps are enforced in pixel
//! space (`min_gap_px`) and time space ([`MIN_GAP_MS`]) at once; whichever
//! is stricter for the current duration/width ratio wins.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SliderConfig;
use crate::session::TrimRange;
use crate::time::{MIN_GAP_MS, format_clock, px_to_time, time_to_px};

/// Which end of the range a handle controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    Start,
    End,
}

/// A decorative time label on the track.
#[derive(Debug, Clone, PartialEq)]
pub struct TickMark {
    pub time_ms: u64,
    pub x_px: f32,
    pub label: String,
}

/// Range slider state: both handle values plus in-flight gestures.
#[derive(Debug, Clone)]
pub struct RangeSlider {
    duration_ms: u64,
    width_px: f32,
    range: TrimRange,
    config: SliderConfig,
    start_origin_px: Option<f32>,
    end_origin_px: Option<f32>,
}

impl RangeSlider {
    pub fn new(duration_ms: u64, range: TrimRange, config: SliderConfig) -> Self {
        Self {
            duration_ms,
            width_px: 0.0,
            range,
            config,
            start_origin_px: None,
            end_origin_px: None,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn width_px(&self) -> f32 {
        self.width_px
    }

    pub fn range(&self) -> TrimRange {
        self.range
    }

    /// Updates the laid-out track width. Active gestures are cancelled since
    /// their origins were measured on the old width.
    pub fn set_width(&mut self, width_px: f32) {
        let width_px = if width_px.is_finite() {
            width_px.max(0.0)
        } else {
            0.0
        };
        if (width_px - self.width_px).abs() > f32::EPSILON {
            self.start_origin_px = None;
            self.end_origin_px = None;
        }
        self.width_px = width_px;
    }

    /// Dragging is disabled for durations too short to hold a valid range
    /// and for tracks too narrow to separate the handles.
    pub fn is_enabled(&self) -> bool {
        self.duration_ms >= MIN_GAP_MS
            && self.width_px.is_finite()
            && self.width_px > self.config.min_gap_px
    }

    pub fn handle_x(&self, handle: Handle) -> f32 {
        let t_ms = match handle {
            Handle::Start => self.range.start_ms,
            Handle::End => self.range.end_ms,
        };
        time_to_px(t_ms, self.duration_ms, self.width_px)
    }

    /// X offset of the playback marker, shown only inside the range.
    pub fn marker_x(&self, current_ms: u64) -> Option<f32> {
        let inside = self.range.start_ms <= current_ms && current_ms <= self.range.end_ms;
        (self.is_enabled() && inside)
            .then(|| time_to_px(current_ms, self.duration_ms, self.width_px))
    }

    pub fn is_active(&self, handle: Handle) -> bool {
        self.origin(handle).is_some()
    }

    /// Starts a gesture on `handle`. Returns false when dragging is disabled.
    pub fn begin_drag(&mut self, handle: Handle) -> bool {
        if !self.is_enabled() {
            return false;
        }

        let origin = self.handle_x(handle);
        *self.origin_mut(handle) = Some(origin);
        true
    }

    /// Moves `handle` by `dx_px`, measured from where the gesture began.
    ///
    /// Returns the new range, or `None` when no gesture is active on
    /// `handle` or the slider is disabled.
    pub fn drag(&mut self, handle: Handle, dx_px: f32) -> Option<TrimRange> {
        if !self.is_enabled() || !dx_px.is_finite() {
            return None;
        }
        let origin = self.origin(handle)?;

        let t_ms = self.clamp_handle(handle, origin + dx_px);
        match handle {
            Handle::Start => self.range.start_ms = t_ms,
            Handle::End => self.range.end_ms = t_ms,
        }
        debug_assert!(self.range.start_ms + MIN_GAP_MS <= self.range.end_ms);
        debug!(
            ?handle,
            dx_px,
            start_ms = self.range.start_ms,
            end_ms = self.range.end_ms,
            "range handle dragged"
        );
        Some(self.range)
    }

    /// Applies moves on both handles from one update cycle: start first, then
    /// end against the updated start.
    pub fn drag_both(&mut self, start_dx_px: f32, end_dx_px: f32) -> Option<TrimRange> {
        let start = self.drag(Handle::Start, start_dx_px);
        let end = self.drag(Handle::End, end_dx_px);
        end.or(start)
    }

    /// Ends the gesture. The last computed value is kept as is.
    pub fn end_drag(&mut self, handle: Handle) {
        *self.origin_mut(handle) = None;
    }

    /// `tick_count` evenly spaced labels at `i / N * duration`.
    pub fn ticks(&self) -> Vec<TickMark> {
        let count = self.config.tick_count;
        if count == 0 || self.duration_ms == 0 {
            return Vec::new();
        }

        (0..count)
            .map(|i| {
                let time_ms = self.duration_ms * i as u64 / count as u64;
                TickMark {
                    time_ms,
                    x_px: time_to_px(time_ms, self.duration_ms, self.width_px),
                    label: format_clock(time_ms),
                }
            })
            .collect()
    }

    fn clamp_handle(&self, handle: Handle, x_px: f32) -> u64 {
        let gap_px = self.config.min_gap_px;
        match handle {
            Handle::Start => {
                let end_px = self.handle_x(Handle::End);
                let max_px = (end_px - gap_px).max(0.0);
                let t_ms = px_to_time(x_px.clamp(0.0, max_px), self.width_px, self.duration_ms);
                t_ms.min(self.range.end_ms.saturating_sub(MIN_GAP_MS))
            }
            Handle::End => {
                let start_px = self.handle_x(Handle::Start);
                let min_px = (start_px + gap_px).min(self.width_px);
                let t_ms =
                    px_to_time(x_px.clamp(min_px, self.width_px), self.width_px, self.duration_ms);
                t_ms.max(self.range.start_ms + MIN_GAP_MS)
                    .min(self.duration_ms)
            }
        }
    }

    fn origin(&self, handle: Handle) -> Option<f32> {
        match handle {
            Handle::Start => self.start_origin_px,
            Handle::End => self.end_origin_px,
        }
    }

    fn origin_mut(&mut self, handle: Handle) -> &mut Option<f32> {
        match handle {
            Handle::Start => &mut self.start_origin_px,
            Handle::End => &mut self.end_origin_px,
        }
    }
}
