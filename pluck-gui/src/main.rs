//! # Pluck - Real-time String Tuner GUI
//!
//! The presentation shell around `pluck-core`. All analysis, holding and
//! smoothing happens on the session's worker thread; this application
//! only renders the newest published display state.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Analysis Thread**: owned by the core `Session`, captures and analyses audio
//! - **Communication**: latest-value channel, the GUI never blocks the analysis
//! - **Updates**: 60 FPS continuous updates via subscription system

mod ui;

use anyhow::{Context, Result};
use iced::{Element, Subscription, Theme};
use pluck_core::audio::CpalSource;
use pluck_core::latest::Subscriber;
use pluck_core::{DisplayState, Session, SessionError, TunerConfig};
use std::path::Path;

use ui::main_display::create_main_view;

/// Main entry point for the Pluck application.
///
/// An optional first argument names a JSON file with configuration
/// overrides.
pub fn main() -> iced::Result {
    env_logger::init();
    log::info!("Starting Pluck...");
    let result = iced::application("Pluck", TunerApp::update, TunerApp::view)
        .subscription(TunerApp::subscription)
        .theme(TunerApp::theme)
        .run();
    log::info!("Application finished with result: {:?}", result);
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    /// Timer tick for real-time updates
    Tick,
    /// User asked to start the session again after a failure
    Retry,
}

/// Whether audio capture is running, and why not if it isn't.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioStatus {
    Running,
    PermissionNeeded,
    DeviceError(String),
}

struct TunerApp {
    config: TunerConfig,
    session: Option<Session>,
    display_rx: Option<Subscriber<DisplayState>>,
    status: AudioStatus,
    display: DisplayState,
}

impl Default for TunerApp {
    fn default() -> Self {
        let config = match std::env::args().nth(1) {
            Some(path) => load_config(Path::new(&path)).unwrap_or_else(|e| {
                log::error!("Ignoring configuration file: {:#}", e);
                TunerConfig::default()
            }),
            None => TunerConfig::default(),
        };

        let mut app = Self {
            config,
            session: None,
            display_rx: None,
            status: AudioStatus::Running,
            display: DisplayState::empty(),
        };
        app.start_session();
        app
    }
}

impl TunerApp {
    /// Starts capture and analysis. Failures are shown, never retried
    /// automatically.
    fn start_session(&mut self) {
        let requested_rate = self.config.sample_rate;
        match Session::start(self.config.clone(), move || CpalSource::open_default(requested_rate)) {
            Ok((session, display_rx)) => {
                log::info!("Audio session started");
                self.session = Some(session);
                self.display_rx = Some(display_rx);
                self.status = AudioStatus::Running;
            }
            Err(e) if e.is_permission_denied() => {
                log::warn!("Microphone permission denied");
                self.status = AudioStatus::PermissionNeeded;
            }
            Err(e) => {
                log::error!("Fatal error starting audio: {}", e);
                self.status = AudioStatus::DeviceError(describe(&e));
            }
        }
    }

    fn update(&mut self, message: Message) {
        match message {
            Message::Tick => {
                if let Some(display_rx) = &self.display_rx {
                    if let Some(state) = display_rx.latest() {
                        self.display = state;
                    }
                }
                if self.session.as_ref().is_some_and(|s| !s.is_running()) {
                    log::warn!("Analysis thread stopped");
                    self.session = None;
                    self.display_rx = None;
                    self.display = DisplayState::empty();
                    self.status = AudioStatus::DeviceError("Audio input stopped".into());
                }
            }
            Message::Retry => {
                if let Some(mut session) = self.session.take() {
                    session.stop();
                }
                self.display = DisplayState::empty();
                self.start_session();
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.status, &self.display)
    }

    /// Fires every 16ms (60 FPS) to pick up the newest reading.
    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(std::time::Duration::from_millis(16)).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Loads configuration overrides from a JSON file. Missing fields keep
/// their defaults.
fn load_config(path: &Path) -> Result<TunerConfig> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: TunerConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing {}", path.display()))?;
    config.validate().context("validating configuration")?;
    Ok(config)
}

fn describe(error: &SessionError) -> String {
    match error {
        SessionError::Capture(e) => e.to_string(),
        other => format!("Could not start audio: {}", other),
    }
}
