//! Shareable-content cache
//!
//! Holds the most recent successful enumeration. A refresh owns the cache
//! from the moment it is requested until the platform's completion handler
//! runs, so readers (target resolution, property panels) never observe a
//! snapshot while a refresh is outstanding and never interleave with it.
//!
//! A failed refresh keeps the previous snapshot: the cache is only ever empty
//! if no enumeration has ever succeeded.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::capture::{CapturePlatform, PlatformError, ShareableContent};

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<Arc<ShareableContent>>,
    refreshing: bool,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct ShareableContentCache {
    state: Mutex<CacheState>,
    idle: Condvar,
}

impl ShareableContentCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn wait_idle(&self) -> MutexGuard<'_, CacheState> {
        let mut state = self.lock();
        while state.refreshing {
            state = self.idle.wait(state).unwrap_or_else(|e| e.into_inner());
        }
        state
    }

    /// Requests a new enumeration from the platform.
    ///
    /// Waits for any refresh already in flight, then takes ownership of the
    /// cache until the platform answers.
    pub fn refresh<P: CapturePlatform + ?Sized>(self: &Arc<Self>, platform: &P) {
        let ticket = self.begin_refresh();
        platform.get_shareable_content(Box::new(move |result| ticket.complete(result)));
    }

    fn begin_refresh(self: &Arc<Self>) -> RefreshTicket {
        let mut state = self.wait_idle();
        state.refreshing = true;
        RefreshTicket {
            cache: Some(Arc::clone(self)),
        }
    }

    fn finish_refresh(&self, result: Option<Result<ShareableContent, PlatformError>>) {
        let mut state = self.lock();
        match result {
            Some(Ok(content)) => {
                log::debug!(
                    "Shareable content refreshed: {} displays, {} windows, {} applications",
                    content.displays.len(),
                    content.windows.len(),
                    content.applications.len()
                );
                state.snapshot = Some(Arc::new(content));
                state.generation += 1;
            }
            Some(Err(e)) => {
                log::warn!("Failed to enumerate shareable content: {}", e);
            }
            None => {
                log::warn!("Shareable content request was dropped without an answer");
            }
        }
        state.refreshing = false;
        drop(state);
        self.idle.notify_all();
    }

    /// Runs `f` with exclusive access to the current snapshot.
    ///
    /// Blocks while a refresh is outstanding.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(Option<&ShareableContent>) -> R) -> R {
        let state = self.wait_idle();
        f(state.snapshot.as_deref())
    }

    /// Current snapshot, waiting for an outstanding refresh first.
    pub fn snapshot(&self) -> Option<Arc<ShareableContent>> {
        self.wait_idle().snapshot.clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Number of successful refreshes so far.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }
}

/// Ownership of the cache for the duration of one refresh.
///
/// Completing consumes the ticket; dropping an uncompleted ticket (the
/// platform discarded the handler) still hands the cache back.
struct RefreshTicket {
    cache: Option<Arc<ShareableContentCache>>,
}

impl RefreshTicket {
    fn complete(mut self, result: Result<ShareableContent, PlatformError>) {
        if let Some(cache) = self.cache.take() {
            cache.finish_refresh(Some(result));
        }
    }
}

impl Drop for RefreshTicket {
    fn drop(&mut self) {
        if let Some(cache) = self.cache.take() {
            cache.finish_refresh(None);
        }
    }
}
