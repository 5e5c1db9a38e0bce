//! Property-based tests for range editing and the time/pixel mapping.

use engine::time::ms_per_px;
use engine::{
    BoundaryAction, BoundaryPolicy, Handle, MIN_GAP_MS, RangeSlider, SliderConfig, TrimRange,
    boundary_action, px_to_time, time_to_px,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Gesture {
    Start(f32),
    End(f32),
    Both(f32, f32),
}

fn gesture() -> impl Strategy<Value = Gesture> {
    prop_oneof![
        (-4_000.0f32..4_000.0).prop_map(Gesture::Start),
        (-4_000.0f32..4_000.0).prop_map(Gesture::End),
        (-4_000.0f32..4_000.0, -4_000.0f32..4_000.0).prop_map(|(a, b)| Gesture::Both(a, b)),
    ]
}

fn apply(slider: &mut RangeSlider, gesture: &Gesture) {
    match *gesture {
        Gesture::Start(dx) => {
            slider.begin_drag(Handle::Start);
            slider.drag(Handle::Start, dx);
            slider.end_drag(Handle::Start);
        }
        Gesture::End(dx) => {
            slider.begin_drag(Handle::End);
            slider.drag(Handle::End, dx);
            slider.end_drag(Handle::End);
        }
        Gesture::Both(start_dx, end_dx) => {
            slider.begin_drag(Handle::Start);
            slider.begin_drag(Handle::End);
            slider.drag_both(start_dx, end_dx);
            slider.end_drag(Handle::Start);
            slider.end_drag(Handle::End);
        }
    }
}

// =============================================================================
// Slider invariants
// =============================================================================

proptest! {
    /// Any gesture sequence keeps the range inside the clip with the minimum gap.
    #[test]
    fn gestures_preserve_gap_and_domain(
        duration_ms in MIN_GAP_MS..=3_600_000,
        width_px in 31.0f32..2_000.0,
        gestures in prop::collection::vec(gesture(), 1..24),
    ) {
        let mut slider = RangeSlider::new(
            duration_ms,
            TrimRange::suggested(duration_ms),
            SliderConfig::default(),
        );
        slider.set_width(width_px);
        prop_assert!(slider.is_enabled());

        for gesture in &gestures {
            apply(&mut slider, gesture);
            let range = slider.range();
            prop_assert!(range.start_ms + MIN_GAP_MS <= range.end_ms, "{range:?}");
            prop_assert!(range.end_ms <= duration_ms, "{range:?}");
        }
    }

    /// Handles never sit closer than the configured pixel gap when the
    /// track is wide enough for the time gap to be the smaller one.
    #[test]
    fn handles_keep_pixel_gap(
        width_px in 100.0f32..1_000.0,
        gestures in prop::collection::vec(gesture(), 1..16),
    ) {
        let duration_ms = 60_000;
        let mut slider = RangeSlider::new(
            duration_ms,
            TrimRange::suggested(duration_ms),
            SliderConfig::default(),
        );
        slider.set_width(width_px);

        for gesture in &gestures {
            apply(&mut slider, gesture);
            let gap = slider.handle_x(Handle::End) - slider.handle_x(Handle::Start);
            prop_assert!(gap >= 30.0 - 0.1, "gap {gap} at width {width_px}");
        }
    }

    /// A short clip disables the slider and keeps its range untouched.
    #[test]
    fn short_clips_ignore_gestures(
        duration_ms in 0u64..MIN_GAP_MS,
        gestures in prop::collection::vec(gesture(), 1..8),
    ) {
        let initial = TrimRange::suggested(duration_ms);
        let mut slider = RangeSlider::new(duration_ms, initial, SliderConfig::default());
        slider.set_width(300.0);

        for gesture in &gestures {
            apply(&mut slider, gesture);
        }
        prop_assert_eq!(slider.range(), initial);
    }
}

// =============================================================================
// Time/pixel mapping
// =============================================================================

proptest! {
    /// Mapping a time to pixels and back loses at most one pixel's worth.
    #[test]
    fn time_px_time_is_within_one_pixel(
        duration_ms in 1u64..=7_200_000,
        width_px in 1.0f32..4_000.0,
        ratio in 0.0f64..=1.0,
    ) {
        let t_ms = (duration_ms as f64 * ratio) as u64;
        let back = px_to_time(time_to_px(t_ms, duration_ms, width_px), width_px, duration_ms);
        let tolerance = ms_per_px(duration_ms, width_px) + 1.0;
        prop_assert!((back as f64 - t_ms as f64).abs() <= tolerance, "{t_ms} -> {back}");
    }

    /// Pixel offsets always land inside the clip.
    #[test]
    fn px_to_time_stays_in_domain(
        duration_ms in 0u64..=7_200_000,
        width_px in -10.0f32..4_000.0,
        x_px in -10_000.0f32..10_000.0,
    ) {
        prop_assert!(px_to_time(x_px, width_px, duration_ms) <= duration_ms);
    }

    /// Pixel positions are finite and on the track for every input.
    #[test]
    fn time_to_px_stays_on_track(
        t_ms in any::<u64>(),
        duration_ms in 0u64..=7_200_000,
        width_px in 0.0f32..4_000.0,
    ) {
        let x = time_to_px(t_ms, duration_ms, width_px);
        prop_assert!(x.is_finite());
        prop_assert!((0.0..=width_px).contains(&x));
    }
}

// =============================================================================
// Boundary policy
// =============================================================================

proptest! {
    /// While playing, positions outside the range are always corrected.
    #[test]
    fn playing_outside_range_is_corrected(
        start_ms in 0u64..100_000,
        len_ms in MIN_GAP_MS..100_000,
        position_ms in 0u64..300_000,
        looping in any::<bool>(),
    ) {
        let range = TrimRange { start_ms, end_ms: start_ms + len_ms };
        let action = boundary_action(
            position_ms,
            range,
            true,
            BoundaryPolicy::from_looping(looping),
        );

        prop_assert_eq!(action == BoundaryAction::Accept, range.contains(position_ms));
    }

    /// Paused positions are never corrected.
    #[test]
    fn paused_positions_are_accepted(
        start_ms in 0u64..100_000,
        end_ms in 0u64..100_000,
        position_ms in any::<u64>(),
    ) {
        let range = TrimRange { start_ms, end_ms };
        prop_assert_eq!(
            boundary_action(position_ms, range, false, BoundaryPolicy::STOP),
            BoundaryAction::Accept
        );
    }
}
