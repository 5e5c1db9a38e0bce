use engine::{Handle, RangeSlider};
use iced::widget::canvas::{self, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Length, Pixels, Point, Rectangle, Size, Theme, alignment, mouse};

/// Horizontal distance from a handle within which a press grabs it.
pub const HANDLE_HIT_PX: f32 = 14.0;

const TRACK_TOP: f32 = 8.0;
const TRACK_HEIGHT: f32 = 32.0;
const HANDLE_WIDTH: f32 = 6.0;

/// Picks the handle a press at `x` grabs, preferring the closer one.
///
/// When both handles are equally close the end handle wins for presses at
/// or right of it, so collapsed handles can still be pulled apart.
pub fn hit_handle(x: f32, start_x: f32, end_x: f32) -> Option<Handle> {
    let to_start = (x - start_x).abs();
    let to_end = (x - end_x).abs();
    if to_start > HANDLE_HIT_PX && to_end > HANDLE_HIT_PX {
        return None;
    }

    if to_end < to_start || (to_end == to_start && x >= end_x) {
        Some(Handle::End)
    } else {
        Some(Handle::Start)
    }
}

#[derive(Debug, Default)]
struct SliderState {
    gesture: Option<Gesture>,
    reported_width: Option<f32>,
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    handle: Handle,
    press_x: f32,
}

/// Callbacks the slider reports through.
#[derive(Debug, Clone, Copy)]
pub struct SliderMessages<Message> {
    pub resized: fn(f32) -> Message,
    pub pressed: fn(Handle) -> Message,
    pub dragged: fn(Handle, f32) -> Message,
    pub released: fn(Handle) -> Message,
}

struct RangeSliderProgram<'a, Message> {
    slider: &'a RangeSlider,
    current_ms: Option<u64>,
    messages: SliderMessages<Message>,
}

impl<Message> canvas::Program<Message> for RangeSliderProgram<'_, Message> {
    type State = SliderState;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        if state.reported_width != Some(bounds.width) {
            state.reported_width = Some(bounds.width);
            state.gesture = None;
            return (
                canvas::event::Status::Ignored,
                Some((self.messages.resized)(bounds.width)),
            );
        }

        let cursor_x = cursor.position().map(|position| position.x - bounds.x);
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if !self.slider.is_enabled() {
                    return (canvas::event::Status::Ignored, None);
                }
                let Some(x) = cursor_x.filter(|_| cursor.is_over(bounds)) else {
                    return (canvas::event::Status::Ignored, None);
                };
                let Some(handle) = hit_handle(
                    x,
                    self.slider.handle_x(Handle::Start),
                    self.slider.handle_x(Handle::End),
                ) else {
                    return (canvas::event::Status::Ignored, None);
                };

                state.gesture = Some(Gesture { handle, press_x: x });
                (
                    canvas::event::Status::Captured,
                    Some((self.messages.pressed)(handle)),
                )
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                let Some(gesture) = state.gesture else {
                    return (canvas::event::Status::Ignored, None);
                };
                let dx = position.x - bounds.x - gesture.press_x;
                (
                    canvas::event::Status::Captured,
                    Some((self.messages.dragged)(gesture.handle, dx)),
                )
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                match state.gesture.take() {
                    Some(gesture) => (
                        canvas::event::Status::Captured,
                        Some((self.messages.released)(gesture.handle)),
                    ),
                    None => (canvas::event::Status::Ignored, None),
                }
            }
            _ => (canvas::event::Status::Ignored, None),
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let track = Path::rectangle(
            Point::new(0.0, TRACK_TOP),
            Size::new(bounds.width, TRACK_HEIGHT),
        );
        frame.fill(&track, Color::from_rgb8(22, 24, 29));

        let enabled = self.slider.is_enabled();
        let start_x = self.slider.handle_x(Handle::Start);
        let end_x = self.slider.handle_x(Handle::End);
        let selection = Path::rectangle(
            Point::new(start_x, TRACK_TOP),
            Size::new((end_x - start_x).max(1.0), TRACK_HEIGHT),
        );
        let selection_color = if enabled {
            Color::from_rgb8(55, 110, 188)
        } else {
            Color::from_rgb8(70, 74, 82)
        };
        frame.fill(&selection, selection_color);

        for x in [start_x, end_x] {
            let left = (x - HANDLE_WIDTH / 2.0).clamp(0.0, (bounds.width - HANDLE_WIDTH).max(0.0));
            let handle = Path::rectangle(
                Point::new(left, TRACK_TOP - 4.0),
                Size::new(HANDLE_WIDTH, TRACK_HEIGHT + 8.0),
            );
            frame.fill(&handle, Color::from_rgb8(236, 238, 242));
        }

        if let Some(x) = self.current_ms.and_then(|t_ms| self.slider.marker_x(t_ms)) {
            let marker = Path::line(
                Point::new(x, TRACK_TOP - 2.0),
                Point::new(x, TRACK_TOP + TRACK_HEIGHT + 2.0),
            );
            frame.stroke(
                &marker,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb8(255, 94, 77)),
            );
        }

        for tick in self.slider.ticks() {
            frame.fill_text(canvas::Text {
                content: tick.label,
                position: Point::new(tick.x_px, TRACK_TOP + TRACK_HEIGHT + 4.0),
                color: Color::from_rgb8(160, 164, 172),
                size: Pixels(11.0),
                horizontal_alignment: alignment::Horizontal::Left,
                vertical_alignment: alignment::Vertical::Top,
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if state.gesture.is_some() {
            return mouse::Interaction::Grabbing;
        }
        if !self.slider.is_enabled() {
            return mouse::Interaction::None;
        }

        match cursor.position_in(bounds) {
            Some(position)
                if hit_handle(
                    position.x,
                    self.slider.handle_x(Handle::Start),
                    self.slider.handle_x(Handle::End),
                )
                .is_some() =>
            {
                mouse::Interaction::Grab
            }
            _ => mouse::Interaction::None,
        }
    }
}

/// Renders the two-handle trim slider with its tick labels.
pub fn view<'a, Message>(
    slider: &'a RangeSlider,
    current_ms: Option<u64>,
    messages: SliderMessages<Message>,
) -> Element<'a, Message>
where
    Message: 'a,
{
    container(
        canvas::Canvas::new(RangeSliderProgram {
            slider,
            current_ms,
            messages,
        })
        .width(Length::Fill)
        .height(Length::Fixed(TRACK_TOP + TRACK_HEIGHT + 20.0)),
    )
    .width(Length::Fill)
    .into()
}

#[cfg(test)]
mod tests {
    use engine::{Handle, RangeSlider, SliderConfig, TrimRange};
    use iced::widget::canvas::{self, Program};
    use iced::{Point, Rectangle, mouse};

    use super::{RangeSliderProgram, SliderMessages, SliderState, hit_handle};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Msg {
        Resized(f32),
        Pressed(Handle),
        Dragged(Handle, f32),
        Released(Handle),
    }

    const MESSAGES: SliderMessages<Msg> = SliderMessages {
        resized: Msg::Resized,
        pressed: Msg::Pressed,
        dragged: Msg::Dragged,
        released: Msg::Released,
    };

    const BOUNDS: Rectangle = Rectangle {
        x: 10.0,
        y: 0.0,
        width: 300.0,
        height: 60.0,
    };

    fn slider(duration_ms: u64) -> RangeSlider {
        let mut slider = RangeSlider::new(
            duration_ms,
            TrimRange::suggested(duration_ms),
            SliderConfig::default(),
        );
        slider.set_width(BOUNDS.width);
        slider
    }

    fn settled_state() -> SliderState {
        SliderState {
            gesture: None,
            reported_width: Some(BOUNDS.width),
        }
    }

    fn at(x: f32) -> mouse::Cursor {
        mouse::Cursor::Available(Point::new(BOUNDS.x + x, 20.0))
    }

    fn left(pressed: bool) -> canvas::Event {
        let event = if pressed {
            mouse::Event::ButtonPressed(mouse::Button::Left)
        } else {
            mouse::Event::ButtonReleased(mouse::Button::Left)
        };
        canvas::Event::Mouse(event)
    }

    fn moved(x: f32) -> canvas::Event {
        canvas::Event::Mouse(mouse::Event::CursorMoved {
            position: Point::new(BOUNDS.x + x, 20.0),
        })
    }

    #[test]
    fn hit_test_prefers_closer_handle() {
        assert_eq!(hit_handle(5.0, 0.0, 300.0), Some(Handle::Start));
        assert_eq!(hit_handle(295.0, 0.0, 300.0), Some(Handle::End));
        assert_eq!(hit_handle(150.0, 0.0, 300.0), None);
    }

    #[test]
    fn hit_test_collapsed_handles_split_by_side() {
        assert_eq!(hit_handle(150.0, 150.0, 150.0), Some(Handle::End));
        assert_eq!(hit_handle(149.0, 150.0, 150.0), Some(Handle::Start));
    }

    #[test]
    fn first_event_reports_width() {
        let slider = slider(10_000);
        let program = RangeSliderProgram {
            slider: &slider,
            current_ms: None,
            messages: MESSAGES,
        };
        let mut state = SliderState::default();

        let (_, message) = program.update(&mut state, moved(0.0), BOUNDS, at(0.0));

        assert_eq!(message, Some(Msg::Resized(300.0)));
    }

    #[test]
    fn press_move_release_reports_offset_from_press() {
        let slider = slider(10_000);
        let program = RangeSliderProgram {
            slider: &slider,
            current_ms: None,
            messages: MESSAGES,
        };
        let mut state = settled_state();

        let (_, pressed) = program.update(&mut state, left(true), BOUNDS, at(4.0));
        let (_, dragged) = program.update(&mut state, moved(64.0), BOUNDS, at(64.0));
        let (_, released) = program.update(&mut state, left(false), BOUNDS, at(64.0));

        assert_eq!(pressed, Some(Msg::Pressed(Handle::Start)));
        assert_eq!(dragged, Some(Msg::Dragged(Handle::Start, 60.0)));
        assert_eq!(released, Some(Msg::Released(Handle::Start)));
    }

    #[test]
    fn disabled_slider_ignores_presses() {
        let slider = slider(500);
        let program = RangeSliderProgram {
            slider: &slider,
            current_ms: None,
            messages: MESSAGES,
        };
        let mut state = settled_state();

        let (status, message) = program.update(&mut state, left(true), BOUNDS, at(0.0));

        assert_eq!(status, canvas::event::Status::Ignored);
        assert_eq!(message, None);
        assert_eq!(
            program.mouse_interaction(&state, BOUNDS, at(0.0)),
            mouse::Interaction::None
        );
    }

    #[test]
    fn hovering_a_handle_shows_grab_cursor() {
        let slider = slider(10_000);
        let program = RangeSliderProgram {
            slider: &slider,
            current_ms: None,
            messages: MESSAGES,
        };

        let interaction = program.mouse_interaction(&settled_state(), BOUNDS, at(298.0));

        assert_eq!(interaction, mouse::Interaction::Grab);
    }
}
