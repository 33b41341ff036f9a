//! # Cent Meter Widget
//!
//! A horizontal needle meter for the smoothed cents deviation. The needle
//! turns green while the reading is live and in tune, and the whole meter
//! fades with the signal tier's opacity.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{mouse, Color, Element, Point, Rectangle, Renderer, Size, Theme};

/// Maximum cent deviation range for the meter display.
/// The meter shows deviations from -50 to +50 cents.
const METER_RANGE: f32 = 50.0;

const IN_TUNE: Color = Color::from_rgb(0.204, 0.859, 0.596);
const NEAR: Color = Color::from_rgb(1.0, 0.765, 0.0);
const FAR: Color = Color::from_rgb(1.0, 0.2, 0.2);

/// Cent meter widget for displaying tuning accuracy.
pub struct CentMeter {
    /// Smoothed cents, or None with nothing to show
    cents: Option<i32>,
    in_tune: bool,
    opacity: f32,
}

impl CentMeter {
    pub fn new(cents: Option<i32>, in_tune: bool, opacity: f32) -> Self {
        Self {
            cents,
            in_tune,
            opacity,
        }
    }

    /// Consumes the meter to create an Iced Element.
    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(80.0)),
        )
        .into()
    }

    fn needle_color(&self, cents: i32) -> Color {
        let base = if self.in_tune {
            IN_TUNE
        } else if cents.abs() < 20 {
            NEAR
        } else {
            FAR
        };
        Color { a: self.opacity, ..base }
    }
}

impl<Message> canvas::Program<Message> for CentMeter {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        // Draw meter background
        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, Color::from_rgb8(0x40, 0x40, 0x40));

        // Draw center line
        let center_x = bounds.width / 2.0;
        let center_line = Path::line(
            Point::new(center_x, 0.0),
            Point::new(center_x, bounds.height),
        );
        frame.stroke(
            &center_line,
            Stroke::default()
                .with_width(2.0)
                .with_color(Color { a: self.opacity, ..Color::WHITE }),
        );

        // Draw needle, clamped to the visible range
        if let Some(cents) = self.cents {
            let clamped = (cents as f32).clamp(-METER_RANGE, METER_RANGE);
            let needle_pos = (clamped + METER_RANGE) / (2.0 * METER_RANGE) * bounds.width;

            let needle =
                Path::rectangle(Point::new(needle_pos - 2.0, 0.0), Size::new(4.0, bounds.height));
            frame.fill(&needle, self.needle_color(cents));
        }

        vec![frame.into_geometry()]
    }
}
