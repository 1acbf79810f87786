//! Shareable content: the displays, windows and applications eligible for capture

use serde::Serialize;

pub type DisplayId = u32;
pub type WindowId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayInfo {
    pub id: DisplayId,
    pub name: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationInfo {
    pub bundle_id: String,
    pub name: String,
    pub pid: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: Option<String>,
    pub owner: Option<ApplicationInfo>,
    pub on_screen: bool,
    pub width: u32,
    pub height: u32,
}

impl WindowInfo {
    pub fn owner_name(&self) -> &str {
        self.owner.as_ref().map(|o| o.name.as_str()).unwrap_or("")
    }
}

/// Point-in-time enumeration returned by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShareableContent {
    pub displays: Vec<DisplayInfo>,
    pub windows: Vec<WindowInfo>,
    pub applications: Vec<ApplicationInfo>,
}

impl ShareableContent {
    pub fn find_display(&self, id: DisplayId) -> Option<&DisplayInfo> {
        self.displays.iter().find(|d| d.id == id)
    }

    pub fn find_window(&self, id: WindowId) -> Option<&WindowInfo> {
        self.windows.iter().find(|w| w.id == id)
    }

    pub fn find_application(&self, bundle_id: &str) -> Option<&ApplicationInfo> {
        self.applications.iter().find(|a| a.bundle_id == bundle_id)
    }

    pub fn is_empty(&self) -> bool {
        self.displays.is_empty() && self.windows.is_empty() && self.applications.is_empty()
    }
}
