//! Render bridge: turns the latest delivered frame into a bound GPU texture
//!
//! Runs on the render thread. Once per tick it promotes `current` into `prev`
//! and points the texture at the promoted buffer, creating the texture for
//! the first frame and rebinding it in place afterwards. The outgoing buffer
//! is released only after the texture no longer references it.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::display::{FrameSlot, Promotion};
use crate::error::CaptureError;
use crate::render::{ColorPath, Graphics, GraphicsScope, QuadVertices, SamplerDesc};
use crate::utils::perf::FrameStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was delivered since the last tick.
    Idle,
    /// The promoted buffer is the one already bound.
    Unchanged,
    Created,
    Rebound,
}

struct GpuResources<G: Graphics> {
    sampler: G::Sampler,
    vertex_buffer: G::VertexBuffer,
}

pub struct RenderBridge<G: Graphics> {
    graphics: Arc<G>,
    resources: Option<GpuResources<G>>,
    texture: Option<G::Texture>,
    width: u32,
    height: u32,
    stats: Arc<FrameStats>,
}

impl<G: Graphics> RenderBridge<G> {
    /// Allocates the sampler and vertex buffer. On failure whatever was
    /// already created is destroyed before returning.
    pub fn new(graphics: Arc<G>, stats: Arc<FrameStats>) -> Result<Self, CaptureError> {
        let resources = {
            let _scope = GraphicsScope::enter(&*graphics);
            let sampler = graphics.create_sampler(&SamplerDesc::default())?;
            let vertex_buffer = graphics.create_vertex_buffer(&QuadVertices::sprite(0, 0))?;
            GpuResources {
                sampler,
                vertex_buffer,
            }
        };

        Ok(Self {
            graphics,
            resources: Some(resources),
            texture: None,
            width: 0,
            height: 0,
            stats,
        })
    }

    pub fn tick(&mut self, slot: &FrameSlot) -> Result<TickOutcome, CaptureError> {
        let Some(promotion) = slot.promote() else {
            return Ok(TickOutcome::Idle);
        };
        self.stats.frames_promoted.fetch_add(1, Ordering::Relaxed);

        let Promotion {
            bound,
            unchanged,
            width,
            height,
            outgoing,
        } = promotion;

        if unchanged && self.texture.is_some() {
            drop(outgoing);
            return Ok(TickOutcome::Unchanged);
        }

        let Some(resources) = self.resources.as_mut() else {
            return Ok(TickOutcome::Idle);
        };

        let result = {
            let _scope = GraphicsScope::enter(&*self.graphics);
            self.graphics.update_vertex_buffer(
                &mut resources.vertex_buffer,
                &QuadVertices::sprite(width, height),
            );

            let result = match self.texture.as_mut() {
                Some(texture) => self
                    .graphics
                    .rebind_texture(texture, bound.as_ref())
                    .map(|()| TickOutcome::Rebound),
                None => match self.graphics.texture_from_surface(bound.as_ref()) {
                    Ok(texture) => {
                        self.texture = Some(texture);
                        Ok(TickOutcome::Created)
                    }
                    Err(e) => Err(e),
                },
            };
            if result.is_err() {
                // never leave a texture pointing at a buffer about to be released
                self.texture = None;
            }
            result
        };

        match result {
            Ok(outcome) => {
                self.width = width;
                self.height = height;
                let counter = match outcome {
                    TickOutcome::Created => &self.stats.textures_created,
                    _ => &self.stats.texture_rebinds,
                };
                counter.fetch_add(1, Ordering::Relaxed);
                drop(outgoing);
                Ok(outcome)
            }
            Err(e) => {
                log::error!("Failed to bind captured frame to texture: {}", e);
                self.width = 0;
                self.height = 0;
                drop(outgoing);
                Err(e.into())
            }
        }
    }

    /// Draws the bound texture as a sprite; draws nothing before the first frame.
    pub fn render(&self) {
        let (Some(texture), Some(resources)) = (self.texture.as_ref(), self.resources.as_ref())
        else {
            return;
        };

        let _scope = GraphicsScope::enter(&*self.graphics);
        let linear_srgb = self.graphics.linear_srgb();
        let previous = self.graphics.framebuffer_srgb_enabled();
        self.graphics.enable_framebuffer_srgb(linear_srgb);

        let path = if linear_srgb {
            ColorPath::Linear
        } else {
            ColorPath::NonLinear
        };
        self.graphics
            .draw_sprite(&resources.sampler, &resources.vertex_buffer, texture, path);

        self.graphics.enable_framebuffer_srgb(previous);
    }

    /// Destroys the texture. Call only once no stream can deliver frames.
    pub fn reset(&mut self) {
        if self.texture.is_some() {
            let _scope = GraphicsScope::enter(&*self.graphics);
            self.texture = None;
        }
        self.width = 0;
        self.height = 0;
    }

    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl<G: Graphics> Drop for RenderBridge<G> {
    fn drop(&mut self) {
        let _scope = GraphicsScope::enter(&*self.graphics);
        self.texture = None;
        self.resources = None;
    }
}
