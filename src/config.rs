//! Source settings as persisted by the host
//!
//! Keys: `type` (0 display, 1 window, 2 application), `display`, `window`,
//! `application`, `show_cursor`.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::assets::DEFAULT_SHOW_CURSOR;
use crate::capture::{CaptureTarget, DisplayId, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CaptureType {
    Display,
    Window,
    Application,
}

impl CaptureType {
    pub const ALL: [CaptureType; 3] = [
        CaptureType::Display,
        CaptureType::Window,
        CaptureType::Application,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CaptureType::Display => "Display Capture",
            CaptureType::Window => "Window Capture",
            CaptureType::Application => "Application Capture",
        }
    }
}

impl TryFrom<i64> for CaptureType {
    type Error = anyhow::Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(CaptureType::Display),
            1 => Ok(CaptureType::Window),
            2 => Ok(CaptureType::Application),
            other => Err(anyhow!("unknown capture type {}", other)),
        }
    }
}

impl From<CaptureType> for i64 {
    fn from(value: CaptureType) -> Self {
        match value {
            CaptureType::Display => 0,
            CaptureType::Window => 1,
            CaptureType::Application => 2,
        }
    }
}

/// Window chosen through the host's window picker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSelection {
    pub id: WindowId,
    pub owner_name: String,
    pub title: String,
    pub owner_pid: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    #[serde(rename = "type")]
    pub capture_type: CaptureType,
    pub display: DisplayId,
    pub window: Option<WindowSelection>,
    pub application: String,
    pub show_cursor: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            capture_type: CaptureType::Display,
            display: 0,
            window: None,
            application: String::new(),
            show_cursor: DEFAULT_SHOW_CURSOR,
        }
    }
}

impl SourceSettings {
    /// Host defaults: capture the primary display with the cursor visible.
    pub fn defaults(primary_display: DisplayId) -> Self {
        Self {
            display: primary_display,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid source settings")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to serialize source settings")
    }

    pub fn target(&self) -> CaptureTarget {
        match self.capture_type {
            CaptureType::Display => CaptureTarget::Display(self.display),
            CaptureType::Window => CaptureTarget::Window(
                self.window.as_ref().map(|w| w.id).filter(|id| *id != 0),
            ),
            CaptureType::Application => CaptureTarget::Application {
                display: self.display,
                bundle_id: self.application.clone(),
            },
        }
    }

    pub fn selection(&self) -> Selection {
        Selection {
            target: self.target(),
            hide_cursor: !self.show_cursor,
        }
    }
}

/// The part of the settings that determines the live stream.
///
/// Two settings with equal selections share a stream; anything else forces
/// a teardown and rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub target: CaptureTarget,
    pub hide_cursor: bool,
}
