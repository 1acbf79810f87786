//! Content filters and stream configuration
//!
//! A filter describes exactly what a stream records. It is resolved from the
//! configured target against the current shareable-content snapshot.

use crate::assets::{STREAM_PIXEL_FORMAT, STREAM_QUEUE_DEPTH};
use crate::capture::{
    ApplicationInfo, DisplayId, DisplayInfo, ShareableContent, WindowId, WindowInfo,
};
use crate::error::CaptureError;

/// What the user asked to capture, by identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    Display(DisplayId),
    Window(Option<WindowId>),
    Application {
        display: DisplayId,
        bundle_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentFilter {
    Display(DisplayInfo),
    Window(WindowInfo),
    /// Windows of the given applications, restricted to one display.
    Application {
        display: DisplayInfo,
        applications: Vec<ApplicationInfo>,
    },
}

impl ContentFilter {
    pub fn resolve(
        target: &CaptureTarget,
        content: &ShareableContent,
    ) -> Result<Self, CaptureError> {
        match target {
            CaptureTarget::Display(id) => content
                .find_display(*id)
                .cloned()
                .map(ContentFilter::Display)
                .ok_or(CaptureError::DisplayNotFound(*id)),
            CaptureTarget::Window(None) => Err(CaptureError::NoWindowSelected),
            CaptureTarget::Window(Some(id)) => content
                .find_window(*id)
                .cloned()
                .map(ContentFilter::Window)
                .ok_or(CaptureError::WindowNotFound(*id)),
            CaptureTarget::Application { bundle_id, .. } if bundle_id.is_empty() => {
                Err(CaptureError::NoApplicationSelected)
            }
            CaptureTarget::Application { display, bundle_id } => {
                let display = content
                    .find_display(*display)
                    .cloned()
                    .ok_or(CaptureError::DisplayNotFound(*display))?;
                let application = content
                    .find_application(bundle_id)
                    .cloned()
                    .ok_or_else(|| CaptureError::ApplicationNotFound(bundle_id.clone()))?;
                Ok(ContentFilter::Application {
                    display,
                    applications: vec![application],
                })
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ContentFilter::Display(_) => "display",
            ContentFilter::Window(_) => "window",
            ContentFilter::Application { .. } => "application",
        }
    }

    /// Output size of a stream recording this filter.
    pub fn size(&self) -> (u32, u32) {
        match self {
            ContentFilter::Display(d) | ContentFilter::Application { display: d, .. } => {
                (d.width, d.height)
            }
            ContentFilter::Window(w) => (w.width, w.height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 32-bit BGRA, 8 bits per channel.
    Bgra8,
}

impl PixelFormat {
    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            PixelFormat::Bgra8 => *b"BGRA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfiguration {
    pub width: u32,
    pub height: u32,
    pub queue_depth: u32,
    pub shows_cursor: bool,
    pub pixel_format: PixelFormat,
}

impl StreamConfiguration {
    pub fn for_filter(filter: &ContentFilter, hide_cursor: bool) -> Self {
        let (width, height) = filter.size();
        Self {
            width,
            height,
            queue_depth: STREAM_QUEUE_DEPTH,
            shows_cursor: !hide_cursor,
            pixel_format: STREAM_PIXEL_FORMAT,
        }
    }
}
