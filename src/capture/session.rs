//! Capture session: lifecycle of one platform stream
//!
//! `start` blocks until the platform acknowledges the start request and
//! `stop` blocks until it acknowledges the stop request. Once `stop` returns,
//! the stream will not deliver another sample, which is what allows the
//! owner to release frame buffers and GPU resources afterwards.

use std::sync::Arc;

use crate::capture::completion::{Signaled, completion_pair};
use crate::capture::{
    CapturePlatform, CaptureStream, ContentFilter, StreamConfiguration, StreamOutput,
};
use crate::error::CaptureError;

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    /// Start requested, waiting for the platform's acknowledgement
    Starting,
    Running,
    /// Stop requested, waiting for the platform's acknowledgement
    Stopping,
    /// Terminal; a new session is built for any further capture
    Stopped,
}

impl SessionState {
    /// Check if this state transition is valid
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        use SessionState::*;

        match (self, target) {
            (Uninitialized, Starting) => true,
            (Starting, Running) => true,
            // start failed
            (Starting, Stopped) => true,
            (Running, Stopping) => true,
            (Stopping, Stopped) => true,
            _ => false,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "Uninitialized",
            SessionState::Starting => "Starting",
            SessionState::Running => "Running",
            SessionState::Stopping => "Stopping",
            SessionState::Stopped => "Stopped",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

pub struct CaptureSession {
    stream: Box<dyn CaptureStream>,
    state: SessionState,
    kind: &'static str,
}

impl CaptureSession {
    /// Creates the stream and starts it, blocking until the platform answers.
    pub fn start<P: CapturePlatform + ?Sized>(
        platform: &P,
        filter: ContentFilter,
        configuration: StreamConfiguration,
        output: Arc<dyn StreamOutput>,
    ) -> Result<Self, CaptureError> {
        let kind = filter.kind();
        let stream = platform
            .create_stream(filter, configuration, output)
            .map_err(|e| {
                log::error!("Failed to create {} capture stream: {}", kind, e);
                CaptureError::StreamCreation(e)
            })?;

        let mut session = Self {
            stream,
            state: SessionState::Uninitialized,
            kind,
        };
        session.transition(SessionState::Starting);

        let (completion, signal) = completion_pair();
        session.stream.start(completion);
        let result = match signal.wait() {
            Signaled::Completed(Ok(())) => Ok(()),
            Signaled::Completed(Err(e)) => {
                log::error!("Failed to start {} capture stream: {}", kind, e);
                Err(CaptureError::StartFailed(e))
            }
            Signaled::Abandoned => {
                log::error!("Start request for {} capture stream was abandoned", kind);
                Err(CaptureError::CompletionDropped)
            }
        };

        match result {
            Ok(()) => {
                session.transition(SessionState::Running);
                log::info!(
                    "Capture stream started ({}, {}x{}, cursor {})",
                    kind,
                    configuration.width,
                    configuration.height,
                    if configuration.shows_cursor { "shown" } else { "hidden" }
                );
                Ok(session)
            }
            Err(e) => {
                session.transition(SessionState::Stopped);
                Err(e)
            }
        }
    }

    /// Stops the stream and waits for the platform's acknowledgement.
    ///
    /// The session ends `Stopped` whatever the outcome; an error only reports
    /// what the platform said.
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.state.is_running() {
            return Ok(());
        }
        self.transition(SessionState::Stopping);

        let (completion, signal) = completion_pair();
        self.stream.stop(completion);
        let result = match signal.wait() {
            Signaled::Completed(Ok(())) => Ok(()),
            Signaled::Completed(Err(e)) => {
                log::error!("Failed to stop {} capture stream: {}", self.kind, e);
                Err(CaptureError::StopFailed(e))
            }
            Signaled::Abandoned => {
                log::error!("Stop request for {} capture stream was abandoned", self.kind);
                Err(CaptureError::CompletionDropped)
            }
        };

        self.transition(SessionState::Stopped);
        log::info!("Capture stream stopped ({})", self.kind);
        result
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "invalid session transition {} -> {}",
            self.state,
            next
        );
        log::debug!("Capture session [{}]: {} -> {}", self.kind, self.state, next);
        self.state = next;
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
