//! Error taxonomy for the capture source
//!
//! Resolution failures are fatal to one start attempt only, platform failures
//! carry the reason reported by the capture service, and graphics failures
//! abort `create` after rolling back whatever was built.

use thiserror::Error;

use crate::capture::{DisplayId, PlatformError, WindowId};
use crate::render::GraphicsError;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no shareable content snapshot is available")]
    NoShareableContent,

    #[error("display {0} is not available for capture")]
    DisplayNotFound(DisplayId),

    #[error("window {0} is not available for capture")]
    WindowNotFound(WindowId),

    #[error("application '{0}' is not running")]
    ApplicationNotFound(String),

    #[error("window capture selected without a window")]
    NoWindowSelected,

    #[error("application capture selected without an application")]
    NoApplicationSelected,

    #[error("capture stream could not be created: {0}")]
    StreamCreation(#[source] PlatformError),

    #[error("capture stream failed to start: {0}")]
    StartFailed(#[source] PlatformError),

    #[error("capture stream failed to stop: {0}")]
    StopFailed(#[source] PlatformError),

    #[error("completion handler was dropped before it fired")]
    CompletionDropped,

    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}

impl CaptureError {
    /// True for failures caused by a target that vanished from the snapshot.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            CaptureError::NoShareableContent
                | CaptureError::DisplayNotFound(_)
                | CaptureError::WindowNotFound(_)
                | CaptureError::ApplicationNotFound(_)
                | CaptureError::NoWindowSelected
                | CaptureError::NoApplicationSelected
        )
    }
}
