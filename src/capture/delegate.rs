//! Stream delegate: the sink that receives frames on the delivery thread

use std::sync::atomic::Ordering;
use std::sync::{Arc, RwLock, Weak};

use crate::capture::{CaptureSample, StreamOutput};
use crate::display::{FrameRef, FrameSlot};
use crate::utils::perf::FrameStats;

/// Forwards delivered frames into the frame slot.
///
/// Holds a non-owning handle to the slot, resolved per sample. The owning
/// context detaches the delegate once the stream has stopped, after which
/// any late sample is dropped.
pub struct StreamDelegate {
    slot: RwLock<Weak<FrameSlot>>,
    stats: Arc<FrameStats>,
}

impl StreamDelegate {
    pub fn new(slot: &Arc<FrameSlot>, stats: Arc<FrameStats>) -> Arc<Self> {
        Arc::new(Self {
            slot: RwLock::new(Arc::downgrade(slot)),
            stats,
        })
    }

    pub fn detach(&self) {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = Weak::new();
    }

    pub fn is_attached(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .strong_count()
            > 0
    }
}

impl StreamOutput for StreamDelegate {
    fn did_output_sample(&self, sample: CaptureSample) {
        // intermittent samples without an image are expected
        let Some(surface) = sample.image_buffer else {
            self.stats.empty_samples.fetch_add(1, Ordering::Relaxed);
            log::trace!(
                "Dropping sample without image buffer at {:?}",
                sample.presentation_time
            );
            return;
        };

        // held until the frame is in the slot, so detach waits for this delivery
        let handle = self.slot.read().unwrap_or_else(|e| e.into_inner());
        let Some(slot) = handle.upgrade() else {
            log::trace!(
                "Sample at {:?} delivered after detach, dropping",
                sample.presentation_time
            );
            return;
        };

        self.stats.frames_delivered.fetch_add(1, Ordering::Relaxed);
        let displaced = slot.publish(FrameRef::acquire(surface));
        drop(handle);
        if displaced.is_some() {
            self.stats.frames_overwritten.fetch_add(1, Ordering::Relaxed);
        }
        // released here, after the slot lock
        drop(displaced);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SurfaceLedger;
    use std::time::Duration;

    fn sample(surface: Option<Arc<dyn crate::capture::NativeSurface>>) -> CaptureSample {
        CaptureSample {
            image_buffer: surface,
            presentation_time: Duration::ZERO,
        }
    }

    #[test]
    fn test_forwards_frames_into_slot() {
        let ledger = SurfaceLedger::new();
        let slot = FrameSlot::new();
        let stats = Arc::new(FrameStats::new());
        let delegate = StreamDelegate::new(&slot, Arc::clone(&stats));

        delegate.did_output_sample(sample(Some(ledger.surface(1280, 720))));
        delegate.did_output_sample(sample(Some(ledger.surface(1280, 720))));

        assert!(slot.has_pending());
        assert_eq!(ledger.live(), 1);
        let s = stats.snapshot();
        assert_eq!(s.frames_delivered, 2);
        assert_eq!(s.frames_overwritten, 1);
    }

    #[test]
    fn test_empty_sample_is_dropped_silently() {
        let slot = FrameSlot::new();
        let stats = Arc::new(FrameStats::new());
        let delegate = StreamDelegate::new(&slot, Arc::clone(&stats));

        delegate.did_output_sample(sample(None));

        assert!(!slot.has_pending());
        assert_eq!(stats.snapshot().empty_samples, 1);
    }

    #[test]
    fn test_detached_delegate_drops_samples() {
        let ledger = SurfaceLedger::new();
        let slot = FrameSlot::new();
        let delegate = StreamDelegate::new(&slot, Arc::new(FrameStats::new()));
        assert!(delegate.is_attached());

        delegate.detach();
        assert!(!delegate.is_attached());
        delegate.did_output_sample(sample(Some(ledger.surface(4, 4))));

        assert!(!slot.has_pending());
        assert_eq!(ledger.increments(), 0);
    }

    #[test]
    fn test_detach_waits_for_inflight_delivery() {
        let ledger = SurfaceLedger::new();
        let slot = FrameSlot::new();
        let delegate = StreamDelegate::new(&slot, Arc::new(FrameStats::new()));

        let producer = {
            let delegate = Arc::clone(&delegate);
            let ledger = Arc::clone(&ledger);
            std::thread::spawn(move || {
                for _ in 0..2000 {
                    delegate.did_output_sample(sample(Some(ledger.surface(16, 16))));
                }
            })
        };

        std::thread::sleep(Duration::from_millis(1));
        delegate.detach();
        // nothing can land in the slot once detach has returned
        drop(slot.drain());
        producer.join().unwrap();

        assert!(!slot.has_pending());
        assert_eq!(ledger.live(), 0);
    }
}
