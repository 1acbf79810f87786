//! Screen capture source for a video-mixing host.
//!
//! A platform stream delivers frames on its own thread; the host's render
//! tick binds the latest one to a GPU texture. See [`source::CaptureContext`]
//! for the host-facing lifecycle.

pub mod assets;
pub mod capture;
pub mod config;
pub mod display;
pub mod error;
pub mod render;
pub mod simulated;
pub mod source;
pub mod utils;

pub use config::{CaptureType, SourceSettings};
pub use error::CaptureError;
pub use source::{CaptureContext, SourceProperties, UpdateOutcome};
