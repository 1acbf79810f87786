//! Headless graphics device
//!
//! Implements the GPU contract without a GPU: objects are plain records and
//! every call is counted, including calls made outside a graphics scope.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::capture::NativeSurface;
use crate::render::{ColorPath, Graphics, GraphicsError, QuadVertices, SamplerDesc};

#[derive(Debug, Clone, Copy, Default)]
pub struct GraphicsOptions {
    pub linear_srgb: bool,
    pub fail_sampler: bool,
    pub fail_vertex_buffer: bool,
    pub fail_texture: bool,
    pub fail_rebind: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRecord {
    pub surface_id: u64,
    pub extent: (f32, f32),
    pub path: ColorPath,
    pub framebuffer_srgb: bool,
}

#[derive(Debug, Default)]
pub struct GraphicsLedger {
    depth: AtomicI64,
    outside_scope: AtomicU64,
    samplers_created: AtomicU64,
    samplers_destroyed: AtomicU64,
    vertex_buffers_created: AtomicU64,
    vertex_buffers_destroyed: AtomicU64,
    textures_created: AtomicU64,
    textures_destroyed: AtomicU64,
    rebinds: AtomicU64,
    draws: AtomicU64,
    framebuffer_srgb: AtomicBool,
    vertex_extent: Mutex<(f32, f32)>,
    last_draw: Mutex<Option<DrawRecord>>,
}

impl GraphicsLedger {
    fn check_scope(&self, operation: &str) {
        if self.depth.load(Ordering::Acquire) <= 0 {
            self.outside_scope.fetch_add(1, Ordering::Relaxed);
            log::warn!("{} called outside the graphics context", operation);
        }
    }

    pub fn scope_depth(&self) -> i64 {
        self.depth.load(Ordering::Acquire)
    }

    pub fn calls_outside_scope(&self) -> u64 {
        self.outside_scope.load(Ordering::Relaxed)
    }

    pub fn samplers_created(&self) -> u64 {
        self.samplers_created.load(Ordering::Relaxed)
    }

    pub fn samplers_live(&self) -> u64 {
        self.samplers_created() - self.samplers_destroyed.load(Ordering::Relaxed)
    }

    pub fn vertex_buffers_live(&self) -> u64 {
        self.vertex_buffers_created.load(Ordering::Relaxed)
            - self.vertex_buffers_destroyed.load(Ordering::Relaxed)
    }

    pub fn textures_created(&self) -> u64 {
        self.textures_created.load(Ordering::Relaxed)
    }

    pub fn textures_live(&self) -> u64 {
        self.textures_created() - self.textures_destroyed.load(Ordering::Relaxed)
    }

    pub fn rebinds(&self) -> u64 {
        self.rebinds.load(Ordering::Relaxed)
    }

    pub fn draws(&self) -> u64 {
        self.draws.load(Ordering::Relaxed)
    }

    pub fn framebuffer_srgb_enabled(&self) -> bool {
        self.framebuffer_srgb.load(Ordering::Relaxed)
    }

    pub fn vertex_extent(&self) -> (f32, f32) {
        *self.vertex_extent.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn last_draw(&self) -> Option<DrawRecord> {
        *self.last_draw.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct HeadlessSampler {
    pub desc: SamplerDesc,
    ledger: Arc<GraphicsLedger>,
}

impl Drop for HeadlessSampler {
    fn drop(&mut self) {
        self.ledger.check_scope("sampler destroy");
        self.ledger.samplers_destroyed.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct HeadlessVertexBuffer {
    pub vertices: QuadVertices,
    ledger: Arc<GraphicsLedger>,
}

impl Drop for HeadlessVertexBuffer {
    fn drop(&mut self) {
        self.ledger.check_scope("vertex buffer destroy");
        self.ledger
            .vertex_buffers_destroyed
            .fetch_add(1, Ordering::Relaxed);
    }
}

pub struct HeadlessTexture {
    pub surface_id: u64,
    pub width: u32,
    pub height: u32,
    ledger: Arc<GraphicsLedger>,
}

impl Drop for HeadlessTexture {
    fn drop(&mut self) {
        self.ledger.check_scope("texture destroy");
        self.ledger.textures_destroyed.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct HeadlessGraphics {
    ledger: Arc<GraphicsLedger>,
    options: Mutex<GraphicsOptions>,
}

impl HeadlessGraphics {
    pub fn new(options: GraphicsOptions) -> Arc<Self> {
        Arc::new(Self {
            ledger: Arc::new(GraphicsLedger::default()),
            options: Mutex::new(options),
        })
    }

    pub fn ledger(&self) -> &GraphicsLedger {
        &self.ledger
    }

    pub fn configure(&self, f: impl FnOnce(&mut GraphicsOptions)) {
        f(&mut self.options.lock().unwrap_or_else(|e| e.into_inner()));
    }

    fn options(&self) -> GraphicsOptions {
        *self.options.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Graphics for HeadlessGraphics {
    type Texture = HeadlessTexture;
    type Sampler = HeadlessSampler;
    type VertexBuffer = HeadlessVertexBuffer;

    fn enter_context(&self) {
        self.ledger.depth.fetch_add(1, Ordering::AcqRel);
    }

    fn leave_context(&self) {
        self.ledger.depth.fetch_sub(1, Ordering::AcqRel);
    }

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Self::Sampler, GraphicsError> {
        self.ledger.check_scope("sampler create");
        if self.options().fail_sampler {
            return Err(GraphicsError::new("create sampler", "out of memory"));
        }
        self.ledger.samplers_created.fetch_add(1, Ordering::Relaxed);
        Ok(HeadlessSampler {
            desc: *desc,
            ledger: Arc::clone(&self.ledger),
        })
    }

    fn create_vertex_buffer(
        &self,
        vertices: &QuadVertices,
    ) -> Result<Self::VertexBuffer, GraphicsError> {
        self.ledger.check_scope("vertex buffer create");
        if self.options().fail_vertex_buffer {
            return Err(GraphicsError::new("create vertex buffer", "out of memory"));
        }
        self.ledger
            .vertex_buffers_created
            .fetch_add(1, Ordering::Relaxed);
        Ok(HeadlessVertexBuffer {
            vertices: *vertices,
            ledger: Arc::clone(&self.ledger),
        })
    }

    fn update_vertex_buffer(&self, buffer: &mut Self::VertexBuffer, vertices: &QuadVertices) {
        self.ledger.check_scope("vertex buffer update");
        buffer.vertices = *vertices;
        *self
            .ledger
            .vertex_extent
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = vertices.extent();
    }

    fn texture_from_surface(
        &self,
        surface: &dyn NativeSurface,
    ) -> Result<Self::Texture, GraphicsError> {
        self.ledger.check_scope("texture create");
        if self.options().fail_texture {
            return Err(GraphicsError::new(
                "create texture from surface",
                "unsupported surface",
            ));
        }
        self.ledger.textures_created.fetch_add(1, Ordering::Relaxed);
        Ok(HeadlessTexture {
            surface_id: surface.surface_id(),
            width: surface.width(),
            height: surface.height(),
            ledger: Arc::clone(&self.ledger),
        })
    }

    fn rebind_texture(
        &self,
        texture: &mut Self::Texture,
        surface: &dyn NativeSurface,
    ) -> Result<(), GraphicsError> {
        self.ledger.check_scope("texture rebind");
        if self.options().fail_rebind {
            return Err(GraphicsError::new("rebind texture", "surface lost"));
        }
        texture.surface_id = surface.surface_id();
        texture.width = surface.width();
        texture.height = surface.height();
        self.ledger.rebinds.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn linear_srgb(&self) -> bool {
        self.options().linear_srgb
    }

    fn framebuffer_srgb_enabled(&self) -> bool {
        self.ledger.framebuffer_srgb.load(Ordering::Relaxed)
    }

    fn enable_framebuffer_srgb(&self, enable: bool) {
        self.ledger.framebuffer_srgb.store(enable, Ordering::Relaxed);
    }

    fn draw_sprite(
        &self,
        _sampler: &Self::Sampler,
        vertex_buffer: &Self::VertexBuffer,
        texture: &Self::Texture,
        path: ColorPath,
    ) {
        self.ledger.check_scope("draw");
        self.ledger.draws.fetch_add(1, Ordering::Relaxed);
        *self.ledger.last_draw.lock().unwrap_or_else(|e| e.into_inner()) = Some(DrawRecord {
            surface_id: texture.surface_id,
            extent: vertex_buffer.vertices.extent(),
            path,
            framebuffer_srgb: self.framebuffer_srgb_enabled(),
        });
    }
}
