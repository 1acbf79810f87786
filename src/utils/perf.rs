use std::sync::atomic::{AtomicU64, Ordering};

/// Lightweight hand-off counters shared by the delivery thread and the
/// render tick, logged as a summary periodically.
#[derive(Debug, Default)]
pub struct FrameStats {
    pub frames_delivered: AtomicU64,
    pub empty_samples: AtomicU64,
    pub frames_overwritten: AtomicU64,
    pub frames_promoted: AtomicU64,
    pub textures_created: AtomicU64,
    pub texture_rebinds: AtomicU64,
    pub ticks_skipped: AtomicU64,
}

/// Values of a [`FrameStats`] at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStatsSnapshot {
    pub frames_delivered: u64,
    pub empty_samples: u64,
    pub frames_overwritten: u64,
    pub frames_promoted: u64,
    pub textures_created: u64,
    pub texture_rebinds: u64,
    pub ticks_skipped: u64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> FrameStatsSnapshot {
        FrameStatsSnapshot {
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            empty_samples: self.empty_samples.load(Ordering::Relaxed),
            frames_overwritten: self.frames_overwritten.load(Ordering::Relaxed),
            frames_promoted: self.frames_promoted.load(Ordering::Relaxed),
            textures_created: self.textures_created.load(Ordering::Relaxed),
            texture_rebinds: self.texture_rebinds.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
        }
    }

    /// Reads and zeroes every counter, one atomic swap each.
    pub fn take(&self) -> FrameStatsSnapshot {
        FrameStatsSnapshot {
            frames_delivered: self.frames_delivered.swap(0, Ordering::Relaxed),
            empty_samples: self.empty_samples.swap(0, Ordering::Relaxed),
            frames_overwritten: self.frames_overwritten.swap(0, Ordering::Relaxed),
            frames_promoted: self.frames_promoted.swap(0, Ordering::Relaxed),
            textures_created: self.textures_created.swap(0, Ordering::Relaxed),
            texture_rebinds: self.texture_rebinds.swap(0, Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.swap(0, Ordering::Relaxed),
        }
    }

    /// Logs the counters accumulated since the last summary and starts a new interval.
    pub fn log_summary(&self, source_name: &str) {
        let s = self.take();
        log::info!(
            "Capture [{}]: delivered={} empty={} overwritten={} promoted={} | textures created={} rebound={} | ticks skipped={}",
            source_name,
            s.frames_delivered,
            s.empty_samples,
            s.frames_overwritten,
            s.frames_promoted,
            s.textures_created,
            s.texture_rebinds,
            s.ticks_skipped,
        );
    }
}
