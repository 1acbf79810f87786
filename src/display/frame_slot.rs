//! Frame hand-off between the capture delivery thread and the render tick
//!
//! The slot holds at most two native buffers:
//! - **current**: most recently delivered, not yet consumed by the tick
//! - **prev**: the buffer the GPU texture is bound to
//!
//! A third reference exists only transiently: the outgoing `prev` returned by
//! [`FrameSlot::promote`], which the caller keeps alive until the texture has
//! been rebound and then drops.
//!
//! The producer overwrites `current` (drop-oldest); there is no queue. The
//! mutex covers reference bookkeeping only. Buffers leaving the slot are
//! handed back to the caller so their release runs after the lock is gone.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::capture::NativeSurface;

/// Ownership token for one native buffer.
///
/// Acquiring retains the surface and increments its use count; dropping the
/// token decrements the use count and releases the surface, exactly once.
pub struct FrameRef {
    surface: Arc<dyn NativeSurface>,
}

impl FrameRef {
    pub fn acquire(surface: Arc<dyn NativeSurface>) -> Self {
        surface.increment_use_count();
        Self { surface }
    }

    pub fn surface(&self) -> &Arc<dyn NativeSurface> {
        &self.surface
    }

    pub fn surface_id(&self) -> u64 {
        self.surface.surface_id()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    pub fn same_surface(&self, other: &FrameRef) -> bool {
        self.surface_id() == other.surface_id()
    }
}

impl Drop for FrameRef {
    fn drop(&mut self) {
        self.surface.decrement_use_count();
    }
}

impl std::fmt::Debug for FrameRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FrameRef").field(&self.surface).finish()
    }
}

#[derive(Default)]
struct SlotInner {
    current: Option<FrameRef>,
    prev: Option<FrameRef>,
    width: u32,
    height: u32,
}

/// Result of moving `current` into `prev`.
pub struct Promotion {
    /// The buffer now bound, retained for the duration of the GPU upload.
    pub bound: Arc<dyn NativeSurface>,
    /// The new `prev` is the buffer that was already bound.
    pub unchanged: bool,
    pub width: u32,
    pub height: u32,
    /// The previous `prev`; drop it once the texture no longer points at it.
    pub outgoing: Option<FrameRef>,
}

#[derive(Default)]
pub struct FrameSlot {
    inner: Mutex<SlotInner>,
}

impl FrameSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stores a freshly delivered frame as `current`.
    ///
    /// Returns the unconsumed frame it replaced, for the caller to drop.
    #[must_use = "the displaced frame must be dropped outside the slot lock"]
    pub fn publish(&self, frame: FrameRef) -> Option<FrameRef> {
        let (width, height) = frame.dimensions();
        let mut inner = self.lock();
        inner.width = width;
        inner.height = height;
        inner.current.replace(frame)
    }

    pub fn has_pending(&self) -> bool {
        self.lock().current.is_some()
    }

    /// Moves `current` into `prev`, leaving `current` empty.
    ///
    /// Returns `None` when nothing was delivered since the last promotion.
    pub fn promote(&self) -> Option<Promotion> {
        let mut inner = self.lock();
        let incoming = inner.current.take()?;
        let unchanged = inner
            .prev
            .as_ref()
            .is_some_and(|prev| prev.same_surface(&incoming));
        let bound = Arc::clone(incoming.surface());
        let outgoing = inner.prev.replace(incoming);
        Some(Promotion {
            bound,
            unchanged,
            width: inner.width,
            height: inner.height,
            outgoing,
        })
    }

    /// Id of the buffer currently held as `prev`.
    pub fn bound_surface_id(&self) -> Option<u64> {
        self.lock().prev.as_ref().map(FrameRef::surface_id)
    }

    /// Empties both slots. The returned frames are released when dropped.
    #[must_use = "drained frames must be dropped outside the slot lock"]
    pub fn drain(&self) -> Vec<FrameRef> {
        let mut inner = self.lock();
        inner.width = 0;
        inner.height = 0;
        inner.current.take().into_iter().chain(inner.prev.take()).collect()
    }
}
