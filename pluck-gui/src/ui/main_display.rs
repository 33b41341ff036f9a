//! # Main Display Module
//!
//! Layout of the tuner screen: note readout, frequency, cents and the
//! cent meter, or a message when audio capture is unavailable.

use iced::widget::{button, column, container, row, text, Space};
use iced::{Alignment, Color, Element, Length};
use pluck_core::{DisplayState, SignalTier};

use super::cent_meter;
use crate::{AudioStatus, Message};

/// Creates the complete main application view
pub fn create_main_view(status: &AudioStatus, display: &DisplayState) -> Element<'static, Message> {
    let body = match status {
        AudioStatus::Running => create_tuner_panel(display),
        AudioStatus::PermissionNeeded => create_message_panel(
            "Microphone access is needed. Grant permission in your system settings, then retry.",
        ),
        AudioStatus::DeviceError(reason) => create_message_panel(reason),
    };

    container(column![text("Pluck").size(28), Space::with_height(20), body].padding(20))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Note name, frequency and cents above the cent meter.
fn create_tuner_panel(display: &DisplayState) -> Element<'static, Message> {
    let faded = Color {
        a: display.opacity,
        ..Color::WHITE
    };

    let (note_name, freq_text, cents_text) = match &display.observation {
        Some(observation) => (
            observation.note_name().to_string(),
            format!("{:.2} Hz", observation.frequency_hz()),
            format!("{:+} cents", display.smoothed_cents),
        ),
        None => ("--".to_string(), "-- Hz".to_string(), String::new()),
    };

    let status_text = match display.tier {
        SignalTier::Live if display.in_tune => "In tune",
        SignalTier::Live => "",
        SignalTier::Held => "Holding",
        SignalTier::NoSignal => "Play a string",
    };

    let meter_cents = display.observation.as_ref().map(|_| display.smoothed_cents);

    column![
        row![
            text(note_name).size(64).color(faded),
            Space::with_width(20),
            column![
                text(freq_text).size(20).color(faded),
                text(cents_text).size(20).color(faded),
            ]
            .spacing(4),
        ]
        .align_y(Alignment::Center),
        Space::with_height(10),
        cent_meter::CentMeter::new(meter_cents, display.in_tune, display.opacity).view(),
        Space::with_height(5),
        text(status_text).size(16).color(faded),
    ]
    .spacing(5)
    .width(Length::Fill)
    .into()
}

fn create_message_panel(message: &str) -> Element<'static, Message> {
    column![
        text(message.to_string()).size(20),
        Space::with_height(10),
        button(text("Retry")).on_press(Message::Retry),
    ]
    .spacing(5)
    .into()
}
