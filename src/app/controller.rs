// SPDX-License-Identifier: GPL-3.0-only

//! Scan controller
//!
//! Owns the cancellation token of the active session, the preview sink and the
//! recent-results list. At most one session runs at a time: starting while a
//! session is active cancels it and waits for its camera to be released before
//! the new one acquires.

use crate::app::frame_processor::{
    DecodeResult, RxingReader, ScanLoop, ScanState, ScanSummary, SymbolReader, Symbology,
};
use crate::app::recent_results::RecentResults;
use crate::backends::camera::{CameraBackend, CaptureOptions, Facing, PreviewSink};
use crate::config::Config;
use crate::errors::{ScanError, ScanResult};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

type ReaderFactory = Box<dyn Fn() -> Box<dyn SymbolReader> + Send + Sync>;
type ResultListener = Arc<dyn Fn(&DecodeResult) + Send + Sync>;

struct ActiveSession {
    cancel: CancellationToken,
    state: watch::Receiver<ScanState>,
    task: JoinHandle<ScanResult<ScanSummary>>,
}

pub struct ScanController {
    backend: Arc<dyn CameraBackend>,
    sink: PreviewSink,
    facing: Facing,
    options: CaptureOptions,
    new_reader: ReaderFactory,
    listener: Option<ResultListener>,
    recent: Arc<Mutex<RecentResults>>,
    session: Option<ActiveSession>,
}

impl ScanController {
    /// Controller reading the given symbologies with the rxing reader
    pub fn new(backend: Arc<dyn CameraBackend>, symbologies: &[Symbology]) -> Self {
        let symbologies = symbologies.to_vec();
        Self::with_reader_factory(backend, move || {
            Box::new(RxingReader::new(&symbologies)) as Box<dyn SymbolReader>
        })
    }

    pub fn from_config(backend: Arc<dyn CameraBackend>, config: &Config) -> Self {
        Self::new(backend, &config.symbologies)
            .with_facing(config.facing)
            .with_capture_options(config.capture_options())
    }

    /// Controller building a fresh reader for every session
    pub fn with_reader_factory<F>(backend: Arc<dyn CameraBackend>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn SymbolReader> + Send + Sync + 'static,
    {
        Self {
            backend,
            sink: PreviewSink::new(),
            facing: Facing::default(),
            options: CaptureOptions::default(),
            new_reader: Box::new(factory),
            listener: None,
            recent: Arc::new(Mutex::new(RecentResults::default())),
            session: None,
        }
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_capture_options(mut self, options: CaptureOptions) -> Self {
        self.options = options;
        self
    }

    /// Called for every decode, after it has been added to the recent list
    pub fn with_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&DecodeResult) + Send + Sync + 'static,
    {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Sink the camera preview is bound to
    pub fn sink(&self) -> &PreviewSink {
        &self.sink
    }

    /// Start a session, cancelling the active one first
    pub async fn start(&mut self) {
        if self.session.is_some() {
            debug!("Restarting scan session");
            self.stop().await;
        }

        let reader = (self.new_reader)();
        let scan = ScanLoop::new(Arc::clone(&self.backend), self.sink.clone(), reader)
            .with_facing(self.facing)
            .with_capture_options(self.options);
        let state = scan.state();
        let cancel = CancellationToken::new();

        let recent = Arc::clone(&self.recent);
        let listener = self.listener.clone();
        let task = tokio::spawn(scan.run(cancel.clone(), move |result| {
            recent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(&result);
            if let Some(listener) = &listener {
                listener(&result);
            }
        }));

        info!(facing = %self.facing, "Scan session started");
        self.session = Some(ActiveSession {
            cancel,
            state,
            task,
        });
    }

    /// Cancel the active session and wait for it to release the camera
    ///
    /// Returns the session outcome, or `None` if nothing was running.
    pub async fn stop(&mut self) -> Option<ScanResult<ScanSummary>> {
        let session = self.session.take()?;
        session.cancel.cancel();
        Some(Self::finish(session).await)
    }

    /// Start if idle, stop if active; returns whether a session is now active
    pub async fn toggle(&mut self) -> bool {
        if self.is_active() {
            self.stop().await;
            false
        } else {
            self.start().await;
            true
        }
    }

    /// Wait for the active session to end on its own (error or device loss)
    pub async fn wait(&mut self) -> Option<ScanResult<ScanSummary>> {
        let session = self.session.take()?;
        Some(Self::finish(session).await)
    }

    /// Whether a session is running or starting
    pub fn is_active(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| !s.task.is_finished() && *s.state.borrow() != ScanState::Stopped)
            .unwrap_or(false)
    }

    /// State of the current session (`Idle` when none)
    pub fn state(&self) -> ScanState {
        self.session
            .as_ref()
            .map(|s| *s.state.borrow())
            .unwrap_or_default()
    }

    /// Rendered decodes, newest first
    pub fn recent(&self) -> Vec<String> {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec()
    }

    async fn finish(session: ActiveSession) -> ScanResult<ScanSummary> {
        let outcome = session.task.await.unwrap_or_else(|e| Err(ScanError::from(e)));
        if let Err(e) = &outcome {
            error!(error = %e, "Scan session failed");
        }
        outcome
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
        }
    }
}
