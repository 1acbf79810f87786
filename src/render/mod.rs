//! Render-thread half of the source: the GPU contract, sprite geometry and
//! the bridge that binds captured frames to a texture.

mod bridge;
mod gpu;
mod quad;

pub use bridge::{RenderBridge, TickOutcome};
pub use gpu::{
    AddressMode, ColorPath, Filter, Graphics, GraphicsError, GraphicsScope, SamplerDesc,
};
pub use quad::{QuadVertices, Vertex};
