//! Screen capture module
//!
//! Platform-facing half of the source: the capture service contract, the
//! shareable-content cache, content filters, the stream session lifecycle
//! and the delegate that receives frames on the delivery thread.

mod cache;
pub mod completion;
mod content;
mod delegate;
mod filter;
mod session;
mod traits;

pub use cache::ShareableContentCache;
pub use content::{
    ApplicationInfo, DisplayId, DisplayInfo, ShareableContent, WindowId, WindowInfo,
};
pub use delegate::StreamDelegate;
pub use filter::{CaptureTarget, ContentFilter, PixelFormat, StreamConfiguration};
pub use session::{CaptureSession, SessionState};
pub use traits::{
    CapturePlatform, CaptureSample, CaptureStream, Completion, NativeSurface, PlatformError,
    StreamOutput,
};
