use std::time::Duration;

use crate::capture::PixelFormat;

/// Frames the platform may keep in flight for one stream.
pub const STREAM_QUEUE_DEPTH: u32 = 5;
pub const STREAM_PIXEL_FORMAT: PixelFormat = PixelFormat::Bgra8;

pub const DEFAULT_SHOW_CURSOR: bool = true;

pub const STATS_LOG_INTERVAL: Duration = Duration::from_secs(5);

// demo host
pub const HOST_FRAME_RATE: u32 = 60;
pub const SIMULATED_FRAME_RATE: u32 = 30;
pub const SIMULATED_DISPLAY_WIDTH: u32 = 1920;
pub const SIMULATED_DISPLAY_HEIGHT: u32 = 1080;

#[cfg(target_os = "windows")]
pub const TARGET_OS: &str = "windows";
#[cfg(target_os = "macos")]
pub const TARGET_OS: &str = "macos";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const TARGET_OS: &str = "linux";
