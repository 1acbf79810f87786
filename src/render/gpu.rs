//! Graphics abstraction consumed by the render bridge
//!
//! Every call that creates, rebinds, binds or destroys a GPU object runs
//! inside a [`GraphicsScope`], the host's graphics-context acquisition.

use thiserror::Error;

use crate::capture::NativeSurface;
use crate::render::QuadVertices;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to {operation}: {reason}")]
pub struct GraphicsError {
    pub operation: &'static str,
    pub reason: String,
}

impl GraphicsError {
    pub fn new(operation: &'static str, reason: impl Into<String>) -> Self {
        Self {
            operation,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Linear,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Clamp,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerDesc {
    pub filter: Filter,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            filter: Filter::Linear,
            address_u: AddressMode::Clamp,
            address_v: AddressMode::Clamp,
        }
    }
}

/// How the texture is sampled relative to the framebuffer's color space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPath {
    /// sRGB texture view, decoded to linear on sampling
    Linear,
    NonLinear,
}

pub trait Graphics: Send + Sync + 'static {
    type Texture: Send;
    type Sampler: Send;
    type VertexBuffer: Send;

    /// Acquires the graphics context for the current thread. Nested calls are allowed.
    fn enter_context(&self);

    fn leave_context(&self);

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Self::Sampler, GraphicsError>;

    fn create_vertex_buffer(
        &self,
        vertices: &QuadVertices,
    ) -> Result<Self::VertexBuffer, GraphicsError>;

    fn update_vertex_buffer(&self, buffer: &mut Self::VertexBuffer, vertices: &QuadVertices);

    /// Creates a texture backed by the native buffer, without copying it.
    fn texture_from_surface(&self, surface: &dyn NativeSurface)
    -> Result<Self::Texture, GraphicsError>;

    /// Points an existing texture at a different native buffer.
    fn rebind_texture(
        &self,
        texture: &mut Self::Texture,
        surface: &dyn NativeSurface,
    ) -> Result<(), GraphicsError>;

    /// Whether the pipeline currently renders in linear sRGB space.
    fn linear_srgb(&self) -> bool;

    fn framebuffer_srgb_enabled(&self) -> bool;

    fn enable_framebuffer_srgb(&self, enable: bool);

    /// Binds sampler, vertex buffer and texture and draws a four-vertex triangle strip.
    fn draw_sprite(
        &self,
        sampler: &Self::Sampler,
        vertex_buffer: &Self::VertexBuffer,
        texture: &Self::Texture,
        path: ColorPath,
    );
}

/// Scoped acquisition of the graphics context; released on drop.
pub struct GraphicsScope<'a, G: Graphics + ?Sized> {
    graphics: &'a G,
}

impl<'a, G: Graphics + ?Sized> GraphicsScope<'a, G> {
    pub fn enter(graphics: &'a G) -> Self {
        graphics.enter_context();
        Self { graphics }
    }
}

impl<G: Graphics + ?Sized> Drop for GraphicsScope<'_, G> {
    fn drop(&mut self) {
        self.graphics.leave_context();
    }
}
