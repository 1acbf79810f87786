//! Traits for the platform capture service

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::capture::{ContentFilter, DisplayId, ShareableContent, StreamConfiguration};

/// Failure reported asynchronously by the capture service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} (code {code})")]
pub struct PlatformError {
    pub code: i64,
    pub reason: String,
}

impl PlatformError {
    pub fn new(code: i64, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// Completion handler handed to an asynchronous platform call.
///
/// Being `FnOnce`, it can fire at most once. Dropping it without calling it
/// is observed by the waiting side as an abandoned request.
pub type Completion<T> = Box<dyn FnOnce(Result<T, PlatformError>) + Send + 'static>;

/// Cross-process shared-memory image usable directly as texture backing.
///
/// The use count is the platform's "being displayed" counter and is distinct
/// from memory ownership, which is the `Arc` holding the surface.
pub trait NativeSurface: Send + Sync {
    /// Stable identity of the underlying buffer; equal ids mean the same buffer.
    fn surface_id(&self) -> u64;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn increment_use_count(&self);

    fn decrement_use_count(&self);
}

impl fmt::Debug for dyn NativeSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NativeSurface#{} ({}x{})",
            self.surface_id(),
            self.width(),
            self.height()
        )
    }
}

/// One delivered sample. The platform may deliver samples with no image.
#[derive(Clone)]
pub struct CaptureSample {
    pub image_buffer: Option<Arc<dyn NativeSurface>>,
    pub presentation_time: Duration,
}

/// Sink invoked on the platform's delivery thread for every sample.
pub trait StreamOutput: Send + Sync {
    fn did_output_sample(&self, sample: CaptureSample);
}

/// A stream created by the platform. Start and stop complete asynchronously.
pub trait CaptureStream: Send {
    fn start(&mut self, completion: Completion<()>);

    /// Once `completion` fires the stream must not invoke its output again.
    fn stop(&mut self, completion: Completion<()>);
}

/// Platform capture service: enumeration and stream construction.
pub trait CapturePlatform: Send + Sync + 'static {
    /// Enumerates displays, windows and applications eligible for capture.
    fn get_shareable_content(&self, completion: Completion<ShareableContent>);

    fn create_stream(
        &self,
        filter: ContentFilter,
        configuration: StreamConfiguration,
        output: Arc<dyn StreamOutput>,
    ) -> Result<Box<dyn CaptureStream>, PlatformError>;

    fn primary_display_id(&self) -> DisplayId;
}
