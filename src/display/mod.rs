//! Display components for handing captured frames to the render thread

pub mod frame_slot;

pub use frame_slot::{FrameRef, FrameSlot, Promotion};
