/// Minimum length of a trimmed clip in milliseconds.
pub const MIN_GAP_MS: u64 = 1_000;

/// Converts a time in milliseconds to an x offset on a track `width_px` wide.
///
/// Degenerate inputs (zero duration, non-positive or non-finite width) map to
/// `0.0` instead of producing `NaN` or infinities. Times past the end of the
/// video are pinned to the right edge.
///
/// # Example
/// ```
/// use engine::time::time_to_px;
///
/// assert_eq!(time_to_px(5_000, 10_000, 300.0), 150.0);
/// assert_eq!(time_to_px(5_000, 0, 300.0), 0.0);
/// ```
pub fn time_to_px(t_ms: u64, duration_ms: u64, width_px: f32) -> f32 {
    if !has_track(duration_ms, width_px) {
        return 0.0;
    }

    let ratio = t_ms.min(duration_ms) as f64 / duration_ms as f64;
    (ratio * f64::from(width_px)) as f32
}

/// Converts an x offset on the track back to milliseconds.
///
/// Offsets outside `[0, width_px]` are clamped, so the result always lies in
/// `[0, duration_ms]`.
///
/// # Example
/// ```
/// use engine::time::px_to_time;
///
/// assert_eq!(px_to_time(150.0, 300.0, 10_000), 5_000);
/// assert_eq!(px_to_time(-40.0, 300.0, 10_000), 0);
/// assert_eq!(px_to_time(900.0, 300.0, 10_000), 10_000);
/// ```
pub fn px_to_time(x_px: f32, width_px: f32, duration_ms: u64) -> u64 {
    if !has_track(duration_ms, width_px) || x_px.is_nan() {
        return 0;
    }

    let clamped = x_px.clamp(0.0, width_px);
    let ratio = f64::from(clamped) / f64::from(width_px);
    let t_ms = (ratio * duration_ms as f64).round() as u64;
    t_ms.min(duration_ms)
}

/// Milliseconds covered by one pixel of the track, or `0.0` without a track.
pub fn ms_per_px(duration_ms: u64, width_px: f32) -> f64 {
    if !has_track(duration_ms, width_px) {
        return 0.0;
    }

    duration_ms as f64 / f64::from(width_px)
}

/// Formats milliseconds as `m:ss`, or `h:mm:ss` from one hour on.
///
/// # Example
/// ```
/// use engine::time::format_clock;
///
/// assert_eq!(format_clock(65_400), "1:05");
/// assert_eq!(format_clock(3_723_000), "1:02:03");
/// ```
pub fn format_clock(t_ms: u64) -> String {
    let total_seconds = t_ms / 1_000;
    let hours = total_seconds / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Formats a clip length with one decimal, e.g. `3.5s`.
pub fn format_seconds(t_ms: u64) -> String {
    format!("{:.1}s", t_ms as f64 / 1_000.0)
}

/// Formats a playback rate the way the rate button shows it, e.g. `1.25x`.
pub fn format_rate(rate: f32) -> String {
    let trimmed = format!("{rate:.2}");
    let trimmed = trimmed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}x")
}

fn has_track(duration_ms: u64, width_px: f32) -> bool {
    duration_ms > 0 && width_px.is_finite() && width_px > 0.0
}
