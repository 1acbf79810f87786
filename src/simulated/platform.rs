//! In-process capture platform
//!
//! Behaves like an asynchronous, callback-driven capture service: every
//! request completes on a runtime worker thread, frames are delivered from a
//! generator task (or injected by hand), and stop is acknowledged only once
//! the stream can no longer deliver. Every request and every use-count change
//! is recorded so callers can check ordering afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::runtime::{Handle, Runtime};
use tokio_util::sync::CancellationToken;

use crate::assets::{SIMULATED_DISPLAY_HEIGHT, SIMULATED_DISPLAY_WIDTH};
use crate::capture::{
    ApplicationInfo, CapturePlatform, CaptureSample, CaptureStream, Completion, ContentFilter,
    DisplayId, DisplayInfo, NativeSurface, PlatformError, ShareableContent, StreamConfiguration,
    StreamOutput, WindowInfo,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    EnumerationRequested,
    StreamCreated,
    StartRequested,
    StartCompleted,
    StopRequested,
    StopCompleted,
    UseIncremented(u64),
    UseDecremented(u64),
}

type EventLog = Arc<Mutex<Vec<SimEvent>>>;

fn push_event(log: &Option<EventLog>, event: SimEvent) {
    if let Some(log) = log {
        log.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }
}

/// Use-count bookkeeping across every surface handed out.
#[derive(Debug, Default)]
pub struct SurfaceLedger {
    next_id: AtomicU64,
    increments: AtomicU64,
    decrements: AtomicU64,
    underflows: AtomicU64,
    events: Option<EventLog>,
}

impl SurfaceLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_events(events: Option<EventLog>) -> Arc<Self> {
        Arc::new(Self {
            events,
            ..Self::default()
        })
    }

    pub fn surface(self: &Arc<Self>, width: u32, height: u32) -> Arc<dyn NativeSurface> {
        self.simulated_surface(width, height)
    }

    pub fn simulated_surface(self: &Arc<Self>, width: u32, height: u32) -> Arc<SimulatedSurface> {
        Arc::new(SimulatedSurface {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            width,
            height,
            use_count: AtomicI64::new(0),
            ledger: Arc::clone(self),
        })
    }

    pub fn increments(&self) -> u64 {
        self.increments.load(Ordering::Acquire)
    }

    pub fn decrements(&self) -> u64 {
        self.decrements.load(Ordering::Acquire)
    }

    /// Use counts currently held, across all surfaces.
    pub fn live(&self) -> i64 {
        self.increments() as i64 - self.decrements() as i64
    }

    /// Decrements that took a surface's use count below zero.
    pub fn underflows(&self) -> u64 {
        self.underflows.load(Ordering::Acquire)
    }
}

pub struct SimulatedSurface {
    id: u64,
    width: u32,
    height: u32,
    use_count: AtomicI64,
    ledger: Arc<SurfaceLedger>,
}

impl SimulatedSurface {
    /// Use count held on this surface alone.
    pub fn use_count(&self) -> i64 {
        self.use_count.load(Ordering::Acquire)
    }
}

impl NativeSurface for SimulatedSurface {
    fn surface_id(&self) -> u64 {
        self.id
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn increment_use_count(&self) {
        self.use_count.fetch_add(1, Ordering::AcqRel);
        self.ledger.increments.fetch_add(1, Ordering::AcqRel);
        push_event(&self.ledger.events, SimEvent::UseIncremented(self.id));
    }

    fn decrement_use_count(&self) {
        if self.use_count.fetch_sub(1, Ordering::AcqRel) <= 0 {
            self.ledger.underflows.fetch_add(1, Ordering::AcqRel);
            log::error!("Use count underflow on surface {}", self.id);
        }
        self.ledger.decrements.fetch_add(1, Ordering::AcqRel);
        push_event(&self.ledger.events, SimEvent::UseDecremented(self.id));
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedOptions {
    pub content: ShareableContent,
    /// Frames generated per second while a stream runs; `None` for manual delivery.
    pub frame_rate: Option<u32>,
    pub enumeration_delay: Duration,
    pub start_delay: Duration,
    pub stop_delay: Duration,
    pub fail_enumeration: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
    pub record_events: bool,
}

impl Default for SimulatedOptions {
    fn default() -> Self {
        Self {
            content: default_content(),
            frame_rate: None,
            enumeration_delay: Duration::from_millis(5),
            start_delay: Duration::from_millis(5),
            stop_delay: Duration::from_millis(5),
            fail_enumeration: false,
            fail_start: false,
            fail_stop: false,
            record_events: true,
        }
    }
}

/// Two displays (10 and 20), two applications and three windows.
pub fn default_content() -> ShareableContent {
    let finder = ApplicationInfo {
        bundle_id: "com.apple.finder".into(),
        name: "Finder".into(),
        pid: 410,
    };
    let terminal = ApplicationInfo {
        bundle_id: "com.apple.Terminal".into(),
        name: "Terminal".into(),
        pid: 733,
    };
    ShareableContent {
        displays: vec![
            DisplayInfo {
                id: 10,
                name: "Built-in Display".into(),
                width: SIMULATED_DISPLAY_WIDTH,
                height: SIMULATED_DISPLAY_HEIGHT,
            },
            DisplayInfo {
                id: 20,
                name: "External Display".into(),
                width: 2560,
                height: 1440,
            },
        ],
        windows: vec![
            WindowInfo {
                id: 101,
                title: Some("Downloads".into()),
                owner: Some(finder.clone()),
                on_screen: true,
                width: 900,
                height: 600,
            },
            WindowInfo {
                id: 102,
                title: Some("zsh".into()),
                owner: Some(terminal.clone()),
                on_screen: true,
                width: 720,
                height: 480,
            },
            WindowInfo {
                id: 103,
                title: None,
                owner: Some(terminal.clone()),
                on_screen: false,
                width: 1,
                height: 1,
            },
        ],
        applications: vec![terminal, finder],
    }
}

struct Shared {
    events: Option<EventLog>,
    ledger: Arc<SurfaceLedger>,
    /// Running streams. Delivery happens with this lock held, so removing a
    /// stream guarantees it delivers nothing afterwards.
    outputs: Mutex<HashMap<u64, Arc<dyn StreamOutput>>>,
    next_stream_id: AtomicU64,
    started_at: Instant,
}

impl Shared {
    fn outputs(&self) -> MutexGuard<'_, HashMap<u64, Arc<dyn StreamOutput>>> {
        self.outputs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sample(&self, surface: Option<Arc<dyn NativeSurface>>) -> CaptureSample {
        CaptureSample {
            image_buffer: surface,
            presentation_time: self.started_at.elapsed(),
        }
    }

    fn deliver(&self, stream_id: u64, surface: Option<Arc<dyn NativeSurface>>) {
        let outputs = self.outputs();
        if let Some(output) = outputs.get(&stream_id) {
            output.did_output_sample(self.sample(surface));
        }
    }

    fn deliver_all(&self, surface: Option<Arc<dyn NativeSurface>>) -> usize {
        let outputs = self.outputs();
        for output in outputs.values() {
            output.did_output_sample(self.sample(surface.clone()));
        }
        outputs.len()
    }
}

pub struct SimulatedPlatform {
    runtime: Runtime,
    options: Mutex<SimulatedOptions>,
    shared: Arc<Shared>,
}

impl SimulatedPlatform {
    pub fn new(options: SimulatedOptions) -> std::io::Result<Arc<Self>> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("sim-capture")
            .enable_time()
            .build()?;

        let events = options
            .record_events
            .then(|| Arc::new(Mutex::new(Vec::new())));
        let shared = Arc::new(Shared {
            ledger: SurfaceLedger::with_events(events.clone()),
            events,
            outputs: Mutex::new(HashMap::new()),
            next_stream_id: AtomicU64::new(0),
            started_at: Instant::now(),
        });

        Ok(Arc::new(Self {
            runtime,
            options: Mutex::new(options),
            shared,
        }))
    }

    fn options(&self) -> SimulatedOptions {
        self.options
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn configure(&self, f: impl FnOnce(&mut SimulatedOptions)) {
        f(&mut self.options.lock().unwrap_or_else(|e| e.into_inner()));
    }

    pub fn content(&self) -> ShareableContent {
        self.options().content
    }

    pub fn ledger(&self) -> &Arc<SurfaceLedger> {
        &self.shared.ledger
    }

    /// Delivers a new frame to every running stream; returns the surface id.
    pub fn push_frame(&self, width: u32, height: u32) -> u64 {
        let surface = self.shared.ledger.simulated_surface(width, height);
        let id = surface.surface_id();
        self.shared.deliver_all(Some(surface));
        id
    }

    /// Delivers an existing surface again, as a platform recycling its buffers would.
    pub fn push_surface(&self, surface: Arc<dyn NativeSurface>) {
        self.shared.deliver_all(Some(surface));
    }

    pub fn push_empty_sample(&self) {
        self.shared.deliver_all(None);
    }

    pub fn active_streams(&self) -> usize {
        self.shared.outputs().len()
    }

    pub fn events(&self) -> Vec<SimEvent> {
        match &self.shared.events {
            Some(log) => log.lock().unwrap_or_else(|e| e.into_inner()).clone(),
            None => Vec::new(),
        }
    }

    pub fn count(&self, predicate: impl Fn(&SimEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl CapturePlatform for SimulatedPlatform {
    fn get_shareable_content(&self, completion: Completion<ShareableContent>) {
        push_event(&self.shared.events, SimEvent::EnumerationRequested);
        let options = self.options();
        self.runtime.spawn(async move {
            if !options.enumeration_delay.is_zero() {
                tokio::time::sleep(options.enumeration_delay).await;
            }
            if options.fail_enumeration {
                completion(Err(PlatformError::new(-3801, "screen recording not permitted")));
            } else {
                completion(Ok(options.content));
            }
        });
    }

    fn create_stream(
        &self,
        filter: ContentFilter,
        configuration: StreamConfiguration,
        output: Arc<dyn StreamOutput>,
    ) -> Result<Box<dyn CaptureStream>, PlatformError> {
        if configuration.width == 0 || configuration.height == 0 {
            return Err(PlatformError::new(-3804, "invalid stream dimensions"));
        }
        push_event(&self.shared.events, SimEvent::StreamCreated);
        let id = self.shared.next_stream_id.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!("Simulated stream {} created for {} filter", id, filter.kind());

        Ok(Box::new(SimulatedStream {
            id,
            handle: self.runtime.handle().clone(),
            shared: Arc::clone(&self.shared),
            options: self.options(),
            configuration,
            output: Some(output),
            cancel: CancellationToken::new(),
        }))
    }

    fn primary_display_id(&self) -> DisplayId {
        self.options()
            .content
            .displays
            .first()
            .map(|d| d.id)
            .unwrap_or_default()
    }
}

struct SimulatedStream {
    id: u64,
    handle: Handle,
    shared: Arc<Shared>,
    options: SimulatedOptions,
    configuration: StreamConfiguration,
    output: Option<Arc<dyn StreamOutput>>,
    cancel: CancellationToken,
}

impl CaptureStream for SimulatedStream {
    fn start(&mut self, completion: Completion<()>) {
        push_event(&self.shared.events, SimEvent::StartRequested);
        let id = self.id;
        let shared = Arc::clone(&self.shared);
        let options = self.options.clone();
        let configuration = self.configuration;
        let output = self.output.take();
        let cancel = self.cancel.clone();
        let handle = self.handle.clone();

        self.handle.spawn(async move {
            if !options.start_delay.is_zero() {
                tokio::time::sleep(options.start_delay).await;
            }
            if options.fail_start {
                completion(Err(PlatformError::new(-3802, "failed to start stream")));
                return;
            }
            if let Some(output) = output {
                shared.outputs().insert(id, output);
            }
            if let Some(fps) = options.frame_rate.filter(|fps| *fps > 0) {
                handle.spawn(generate_frames(
                    id,
                    Arc::clone(&shared),
                    configuration,
                    fps,
                    cancel,
                ));
            }
            push_event(&shared.events, SimEvent::StartCompleted);
            completion(Ok(()));
        });
    }

    fn stop(&mut self, completion: Completion<()>) {
        push_event(&self.shared.events, SimEvent::StopRequested);
        self.cancel.cancel();
        let id = self.id;
        let shared = Arc::clone(&self.shared);
        let options = self.options.clone();

        self.handle.spawn(async move {
            if !options.stop_delay.is_zero() {
                tokio::time::sleep(options.stop_delay).await;
            }
            shared.outputs().remove(&id);
            push_event(&shared.events, SimEvent::StopCompleted);
            if options.fail_stop {
                completion(Err(PlatformError::new(-3808, "stream stopped with error")));
            } else {
                completion(Ok(()));
            }
        });
    }
}

impl Drop for SimulatedStream {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.shared.outputs().remove(&self.id);
    }
}

async fn generate_frames(
    id: u64,
    shared: Arc<Shared>,
    configuration: StreamConfiguration,
    fps: u32,
    cancel: CancellationToken,
) {
    let (width, height) = (configuration.width, configuration.height);
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
    let mut delivered = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let surface = shared.ledger.simulated_surface(width, height);
                shared.deliver(id, Some(surface));
                delivered += 1;
            }
        }
    }

    log::debug!("Simulated stream {} generator exited after {} frames", id, delivered);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::completion::{Signaled, completion_pair};
    use crate::capture::{CaptureTarget, StreamDelegate};
    use crate::display::FrameSlot;
    use crate::utils::perf::FrameStats;

    #[test]
    fn test_generator_delivers_until_stopped() {
        let platform = SimulatedPlatform::new(SimulatedOptions {
            frame_rate: Some(200),
            ..Default::default()
        })
        .unwrap();
        let slot = FrameSlot::new();
        let delegate = StreamDelegate::new(&slot, Arc::new(FrameStats::new()));
        let filter = ContentFilter::resolve(&CaptureTarget::Display(10), &platform.content())
            .unwrap();
        let config = StreamConfiguration::for_filter(&filter, false);

        let mut stream = platform.create_stream(filter, config, delegate).unwrap();
        let (completion, signal) = completion_pair();
        stream.start(completion);
        assert_eq!(signal.wait(), Signaled::Completed(Ok(())));

        std::thread::sleep(Duration::from_millis(60));
        assert!(slot.has_pending());

        let (completion, signal) = completion_pair();
        stream.stop(completion);
        assert_eq!(signal.wait(), Signaled::Completed(Ok(())));

        drop(slot.drain());
        let delivered = platform.ledger().increments();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(platform.ledger().increments(), delivered);
        assert_eq!(platform.ledger().live(), 0);
    }

    #[test]
    fn test_zero_sized_stream_rejected() {
        let platform = SimulatedPlatform::new(SimulatedOptions::default()).unwrap();
        let slot = FrameSlot::new();
        let delegate = StreamDelegate::new(&slot, Arc::new(FrameStats::new()));
        let filter = ContentFilter::Display(DisplayInfo {
            id: 1,
            name: String::new(),
            width: 0,
            height: 0,
        });
        let config = StreamConfiguration::for_filter(&filter, false);
        assert!(platform.create_stream(filter, config, delegate).is_err());
    }

    #[test]
    fn test_enumeration_failure_reported() {
        let platform = SimulatedPlatform::new(SimulatedOptions {
            fail_enumeration: true,
            ..Default::default()
        })
        .unwrap();
        let (completion, signal) = completion_pair();
        platform.get_shareable_content(completion);
        assert!(matches!(signal.wait(), Signaled::Completed(Err(_))));
    }
}
