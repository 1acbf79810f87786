//! In-process implementations of the platform capture service and the GPU
//! abstraction. They drive the demo binary and the test suite.

mod graphics;
mod platform;

pub use graphics::{DrawRecord, GraphicsLedger, GraphicsOptions, HeadlessGraphics};
pub use platform::{
    SimEvent, SimulatedOptions, SimulatedPlatform, SimulatedSurface, SurfaceLedger,
    default_content,
};
