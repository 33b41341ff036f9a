//! # Session Module
//!
//! Runs one analysis session on a dedicated thread:
//!
//! - **Worker thread**: opens the audio source, runs every chunk through the
//!   [`Analyzer`] and [`DisplayTracker`] in arrival order, and publishes the
//!   resulting [`DisplayState`]
//! - **Communication**: a latest-value channel towards the presentation
//!   layer and a shutdown channel towards the worker
//! - **Teardown**: the source is stopped on every exit path, and stopping
//!   the session is idempotent
//!
//! The source is created on the worker thread itself, since CPAL streams
//! cannot move between threads on every platform.

use crossbeam_channel::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::analyzer::Analyzer;
use crate::audio::{AudioSource, ChunkResult};
use crate::clock::{Clock, SystemClock};
use crate::config::TunerConfig;
use crate::display::{DisplayState, DisplayTracker};
use crate::error::{CaptureError, SessionError};
use crate::latest::{self, Publisher, Subscriber};

/// Handle to a running analysis session. Dropping it stops the session.
#[derive(Debug)]
pub struct Session {
    shutdown_tx: Option<Sender<()>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Session {
    /// Starts a session with the wall clock.
    ///
    /// Start-up failures (configuration, permission, device) are returned
    /// here and never retried.
    ///
    /// # Arguments
    /// * `config` - Pipeline configuration, validated before anything opens
    /// * `open_source` - Builds the audio source; runs on the worker thread
    ///
    /// # Returns
    /// * `(Session, Subscriber)` - The session handle and the receiving end
    ///   of the display state channel. Dropping the subscriber ends the session.
    pub fn start<S, F>(config: TunerConfig, open_source: F) -> Result<(Session, Subscriber<DisplayState>), SessionError>
    where
        S: AudioSource,
        F: FnOnce() -> Result<S, CaptureError> + Send + 'static,
    {
        Self::start_with_clock(config, SystemClock, open_source)
    }

    /// Starts a session whose time-based stages read `clock`.
    pub fn start_with_clock<S, F, C>(
        config: TunerConfig,
        clock: C,
        open_source: F,
    ) -> Result<(Session, Subscriber<DisplayState>), SessionError>
    where
        S: AudioSource,
        F: FnOnce() -> Result<S, CaptureError> + Send + 'static,
        C: Clock + Send + 'static,
    {
        config.validate()?;

        let (publisher, subscriber) = latest::channel();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let thread_handle = thread::Builder::new()
            .name("pluck-analysis".into())
            .spawn(move || run_worker(config, clock, open_source, publisher, shutdown_rx, ready_tx))?;

        let mut session = Session {
            shutdown_tx: Some(shutdown_tx),
            thread_handle: Some(thread_handle),
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok((session, subscriber)),
            Ok(Err(e)) => {
                session.stop();
                Err(e)
            }
            Err(_) => {
                session.stop();
                Err(SessionError::WorkerExited)
            }
        }
    }

    /// True until the worker has been stopped or has exited on its own.
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the worker and waits for it to release the device.
    ///
    /// Calling this more than once is harmless.
    pub fn stop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            // The worker may already be gone.
            let _ = shutdown_tx.send(());
        }
        if let Some(handle) = self.thread_handle.take() {
            log::info!("Waiting for analysis thread to finish...");
            if handle.join().is_err() {
                log::warn!("Analysis thread panicked");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker<S, F, C>(
    config: TunerConfig,
    clock: C,
    open_source: F,
    publisher: Publisher<DisplayState>,
    shutdown_rx: Receiver<()>,
    ready_tx: Sender<Result<(), SessionError>>,
) where
    S: AudioSource,
    F: FnOnce() -> Result<S, CaptureError>,
    C: Clock,
{
    log::info!("Starting analysis thread...");
    let mut source = match open_source() {
        Ok(source) => source,
        Err(e) => {
            log::error!("Fatal error opening audio source: {}", e);
            let _ = ready_tx.send(Err(e.into()));
            return;
        }
    };

    // The pipeline runs at whatever rate the device actually delivers.
    let config = config.with_sample_rate(source.sample_rate());
    let (mut analyzer, mut tracker) = match Analyzer::new(&config, clock) {
        Ok(analyzer) => (analyzer, DisplayTracker::new(&config)),
        Err(e) => {
            log::error!("Invalid configuration for {} Hz: {}", config.sample_rate, e);
            let _ = ready_tx.send(Err(e.into()));
            return;
        }
    };

    let chunks = match source.start() {
        Ok(chunks) => chunks,
        Err(e) => {
            log::error!("Fatal error starting audio: {}", e);
            source.stop();
            let _ = ready_tx.send(Err(e.into()));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));
    publisher.publish(DisplayState::empty());

    log::info!("Entering audio processing loop at {} Hz", config.sample_rate);
    process_chunks(&chunks, &shutdown_rx, &mut analyzer, &mut tracker, &publisher);

    log::info!("Stopping audio source and exiting...");
    source.stop();
    log::info!("Analysis thread finished");
}

fn process_chunks<C: Clock>(
    chunks: &Receiver<ChunkResult>,
    shutdown_rx: &Receiver<()>,
    analyzer: &mut Analyzer<C>,
    tracker: &mut DisplayTracker,
    publisher: &Publisher<DisplayState>,
) {
    loop {
        crossbeam_channel::select! {
            recv(chunks) -> msg => match msg {
                Ok(Ok(chunk)) if chunk.is_empty() => {
                    log::debug!("Skipping empty audio chunk");
                }
                Ok(Ok(chunk)) => {
                    let result = analyzer.process(&chunk);
                    let state = tracker.update(analyzer.now(), &result);
                    if !publisher.publish(state) {
                        log::info!("Display subscriber dropped");
                        break;
                    }
                }
                Ok(Err(e)) if e.is_fatal() => {
                    log::error!("Audio source failed: {}", e);
                    break;
                }
                Ok(Err(e)) => {
                    log::warn!("Skipping chunk: {}", e);
                }
                Err(_) => {
                    log::info!("Audio channel closed");
                    break;
                }
            },
            recv(shutdown_rx) -> _ => {
                log::info!("Received shutdown signal");
                break;
            },
        }
    }
}
