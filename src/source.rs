//! Capture source: the object a video-mixing host creates per source instance
//!
//! Wires the pieces together. The stream delegate feeds the frame slot from
//! the platform's delivery thread; the render bridge drains it on the host's
//! video tick. Configuration changes tear the stream down and rebuild it from
//! the shareable-content snapshot.
//!
//! Teardown order is fixed: stop the session and wait for the platform's
//! acknowledgement, detach the delegate, destroy the texture, then release
//! the buffers still held by the slot.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use serde::Serialize;

use crate::assets::STATS_LOG_INTERVAL;
use crate::capture::{
    CapturePlatform, CaptureSession, ContentFilter, DisplayId, SessionState, ShareableContent,
    ShareableContentCache, StreamConfiguration, StreamDelegate, WindowId,
};
use crate::config::{CaptureType, Selection, SourceSettings};
use crate::display::FrameSlot;
use crate::error::CaptureError;
use crate::render::{Graphics, RenderBridge, TickOutcome};
use crate::utils::perf::FrameStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Same selection as the live one; nothing was touched.
    Unchanged,
    Rebuilt,
}

/// One choice in a property list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyOption<T> {
    pub label: String,
    pub value: T,
}

/// Property panel contents, built from the shareable-content snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceProperties {
    pub capture_types: Vec<PropertyOption<CaptureType>>,
    pub displays: Vec<PropertyOption<DisplayId>>,
    pub windows: Vec<PropertyOption<WindowId>>,
    pub applications: Vec<PropertyOption<String>>,
    pub show_cursor: bool,
}

impl SourceProperties {
    pub fn from_content(content: Option<&ShareableContent>, settings: &SourceSettings) -> Self {
        let capture_types = CaptureType::ALL
            .iter()
            .map(|t| PropertyOption {
                label: t.label().to_string(),
                value: *t,
            })
            .collect();

        let Some(content) = content else {
            return Self {
                capture_types,
                displays: Vec::new(),
                windows: Vec::new(),
                applications: Vec::new(),
                show_cursor: settings.show_cursor,
            };
        };

        let displays = content
            .displays
            .iter()
            .map(|d| PropertyOption {
                label: format!("{}: {}x{}", d.name, d.width, d.height),
                value: d.id,
            })
            .collect();

        let mut windows: Vec<_> = content
            .windows
            .iter()
            .filter_map(|w| {
                let title = w.title.as_deref().filter(|t| !t.is_empty())?;
                Some((w.owner_name(), title, w.id))
            })
            .collect();
        windows.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(b.1)));
        let windows = windows
            .into_iter()
            .map(|(owner, title, id)| PropertyOption {
                label: format!("[{}] {}", owner, title),
                value: id,
            })
            .collect();

        let mut applications: Vec<_> = content
            .applications
            .iter()
            .filter(|a| !a.bundle_id.is_empty())
            .collect();
        applications.sort_by(|a, b| a.name.cmp(&b.name));
        let applications = applications
            .into_iter()
            .map(|a| PropertyOption {
                label: a.name.clone(),
                value: a.bundle_id.clone(),
            })
            .collect();

        Self {
            capture_types,
            displays,
            windows,
            applications,
            show_cursor: settings.show_cursor,
        }
    }
}

/// Host defaults for a new source: the primary display, cursor shown.
pub fn defaults<P: CapturePlatform + ?Sized>(platform: &P) -> SourceSettings {
    SourceSettings::defaults(platform.primary_display_id())
}

pub struct CaptureContext<P: CapturePlatform, G: Graphics> {
    platform: Arc<P>,
    content: Arc<ShareableContentCache>,
    slot: Arc<FrameSlot>,
    delegate: Option<Arc<StreamDelegate>>,
    session: Option<CaptureSession>,
    bridge: RenderBridge<G>,
    settings: SourceSettings,
    selection: Selection,
    showing: bool,
    stats: Arc<FrameStats>,
    last_stats_log: Instant,
    /// Set once `create` has succeeded.
    created: bool,
}

impl<P: CapturePlatform, G: Graphics> CaptureContext<P, G> {
    /// Allocates GPU resources, enumerates shareable content and starts the
    /// stream for `settings`. Any failure rolls back what was built.
    pub fn create(
        settings: &SourceSettings,
        platform: Arc<P>,
        graphics: Arc<G>,
    ) -> Result<Self, CaptureError> {
        let stats = Arc::new(FrameStats::new());
        let bridge = RenderBridge::new(graphics, Arc::clone(&stats))?;

        let content = ShareableContentCache::new();
        content.refresh(&*platform);

        let mut context = Self {
            platform,
            content,
            slot: FrameSlot::new(),
            delegate: None,
            session: None,
            bridge,
            settings: settings.clone(),
            selection: settings.selection(),
            showing: true,
            stats,
            last_stats_log: Instant::now(),
            created: false,
        };

        context.start_session()?;
        context.created = true;
        log::info!("{} source created", settings.capture_type.label());
        Ok(context)
    }

    fn start_session(&mut self) -> Result<(), CaptureError> {
        let target = &self.selection.target;
        let filter = self
            .content
            .with_snapshot(|snapshot| {
                let content = snapshot.ok_or(CaptureError::NoShareableContent)?;
                ContentFilter::resolve(target, content)
            })
            .inspect_err(|e| log::warn!("Failed to resolve capture target {:?}: {}", target, e))?;

        let configuration = StreamConfiguration::for_filter(&filter, self.selection.hide_cursor);
        let delegate = StreamDelegate::new(&self.slot, Arc::clone(&self.stats));

        match CaptureSession::start(&*self.platform, filter, configuration, delegate.clone()) {
            Ok(session) => {
                self.delegate = Some(delegate);
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                delegate.detach();
                drop(self.slot.drain());
                Err(e)
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.stop() {
                log::warn!("Continuing teardown after stop failure: {}", e);
            }
        }
        if let Some(delegate) = self.delegate.take() {
            delegate.detach();
        }
        self.bridge.reset();
        drop(self.slot.drain());
    }

    /// Applies new settings, rebuilding the stream only when the selection
    /// (mode, target, cursor visibility) differs from the live one.
    ///
    /// On failure the source stays alive but blank; the new selection is kept
    /// so that only a different selection retries.
    pub fn update(&mut self, settings: &SourceSettings) -> Result<UpdateOutcome, CaptureError> {
        let selection = settings.selection();
        self.settings = settings.clone();
        if selection == self.selection {
            return Ok(UpdateOutcome::Unchanged);
        }

        log::info!("Capture selection changed, rebuilding stream");
        self.teardown();
        self.selection = selection;
        self.start_session()?;
        Ok(UpdateOutcome::Rebuilt)
    }

    /// Promotes the latest delivered frame into the texture.
    pub fn video_tick(&mut self, _seconds: f32) {
        if !self.showing || !self.slot.has_pending() {
            self.stats.ticks_skipped.fetch_add(1, Ordering::Relaxed);
        } else if let Ok(TickOutcome::Created) = self.bridge.tick(&self.slot) {
            // errors are logged by the bridge; the next frame retries
            log::debug!(
                "Texture created for {}x{} frames",
                self.bridge.width(),
                self.bridge.height()
            );
        }

        if self.last_stats_log.elapsed() >= STATS_LOG_INTERVAL {
            self.stats.log_summary(self.settings.capture_type.label());
            self.last_stats_log = Instant::now();
        }
    }

    pub fn video_render(&self) {
        self.bridge.render();
    }

    /// Zero until a frame has been bound.
    pub fn width(&self) -> u32 {
        self.bridge.width()
    }

    pub fn height(&self) -> u32 {
        self.bridge.height()
    }

    pub fn show(&mut self) {
        self.showing = true;
    }

    pub fn hide(&mut self) {
        self.showing = false;
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    /// Refreshes the shareable content and lists what can be captured.
    pub fn properties(&self) -> SourceProperties {
        self.content.refresh(&*self.platform);
        self.content
            .with_snapshot(|snapshot| SourceProperties::from_content(snapshot, &self.settings))
    }

    pub fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    /// State of the live session, if one was started.
    pub fn session_state(&self) -> Option<SessionState> {
        self.session.as_ref().map(CaptureSession::state)
    }

    pub fn stats(&self) -> &Arc<FrameStats> {
        &self.stats
    }

    pub fn destroy(self) {
        drop(self);
    }
}

impl<P: CapturePlatform, G: Graphics> Drop for CaptureContext<P, G> {
    fn drop(&mut self) {
        self.teardown();
        if self.created {
            log::info!("{} source destroyed", self.settings.capture_type.label());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{
        GraphicsOptions, HeadlessGraphics, SimEvent, SimulatedOptions, SimulatedPlatform,
    };
    use std::time::Duration;

    type Context = CaptureContext<SimulatedPlatform, HeadlessGraphics>;

    fn setup(options: SimulatedOptions) -> (Arc<SimulatedPlatform>, Arc<HeadlessGraphics>) {
        (
            SimulatedPlatform::new(options).unwrap(),
            HeadlessGraphics::new(GraphicsOptions::default()),
        )
    }

    fn display(id: DisplayId) -> SourceSettings {
        SourceSettings::defaults(id)
    }

    fn create(
        platform: &Arc<SimulatedPlatform>,
        graphics: &Arc<HeadlessGraphics>,
        settings: &SourceSettings,
    ) -> Result<Context, CaptureError> {
        CaptureContext::create(settings, Arc::clone(platform), Arc::clone(graphics))
    }

    fn starts(platform: &SimulatedPlatform) -> usize {
        platform.count(|e| matches!(e, SimEvent::StartRequested))
    }

    fn stops(platform: &SimulatedPlatform) -> usize {
        platform.count(|e| matches!(e, SimEvent::StopRequested))
    }

    #[test]
    fn test_dimensions_zero_until_first_frame() {
        let (platform, graphics) = setup(SimulatedOptions::default());
        let mut context = create(&platform, &graphics, &display(10)).unwrap();

        assert_eq!((context.width(), context.height()), (0, 0));
        context.video_tick(0.016);
        assert_eq!((context.width(), context.height()), (0, 0));

        platform.push_frame(1920, 1080);
        context.video_tick(0.016);
        assert_eq!((context.width(), context.height()), (1920, 1080));
    }

    #[test]
    fn test_use_counts_balance_after_destroy() {
        let (platform, graphics) = setup(SimulatedOptions::default());
        let mut context = create(&platform, &graphics, &display(10)).unwrap();

        for i in 0..40 {
            for _ in 0..(i % 4) {
                platform.push_frame(1920, 1080);
            }
            if i % 5 == 0 {
                platform.push_empty_sample();
            }
            context.video_tick(0.016);
            context.video_render();
        }
        assert!(platform.ledger().live() > 0);

        context.destroy();
        let ledger = platform.ledger();
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.increments(), ledger.decrements());
        assert_eq!(ledger.underflows(), 0);
        assert_eq!(graphics.ledger().textures_live(), 0);
        assert_eq!(graphics.ledger().calls_outside_scope(), 0);
    }

    #[test]
    fn test_drop_oldest_promotes_latest() {
        let (platform, graphics) = setup(SimulatedOptions::default());
        let mut context = create(&platform, &graphics, &display(10)).unwrap();

        let _f1 = platform.push_frame(1920, 1080);
        let _f2 = platform.push_frame(1920, 1080);
        let f3 = platform.push_frame(1920, 1080);
        // f1 and f2 released before any tick
        assert_eq!(platform.ledger().live(), 1);

        context.video_tick(0.016);
        context.video_render();

        let l = graphics.ledger();
        assert_eq!(l.textures_created(), 1);
        assert_eq!(l.rebinds(), 0);
        assert_eq!(l.last_draw().map(|d| d.surface_id), Some(f3));
        assert_eq!(context.stats().frames_overwritten.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_idempotent_tick() {
        let (platform, graphics) = setup(SimulatedOptions::default());
        let mut context = create(&platform, &graphics, &display(10)).unwrap();

        platform.push_frame(1280, 720);
        context.video_tick(0.016);
        context.video_tick(0.016);

        let l = graphics.ledger();
        assert_eq!(l.textures_created() + l.rebinds(), 1);
    }

    #[test]
    fn test_teardown_waits_for_stop_acknowledgement() {
        let (platform, graphics) = setup(SimulatedOptions {
            stop_delay: Duration::from_millis(60),
            ..Default::default()
        });
        let mut context = create(&platform, &graphics, &display(10)).unwrap();

        platform.push_frame(1920, 1080);
        context.video_tick(0.016);
        platform.push_frame(1920, 1080);
        context.destroy();

        let events = platform.events();
        let requested = events
            .iter()
            .position(|e| *e == SimEvent::StopRequested)
            .unwrap();
        let completed = events
            .iter()
            .position(|e| *e == SimEvent::StopCompleted)
            .unwrap();
        assert!(requested < completed);
        assert!(
            !events[requested..completed]
                .iter()
                .any(|e| matches!(e, SimEvent::UseDecremented(_)))
        );
        let released_after = events[completed..]
            .iter()
            .filter(|e| matches!(e, SimEvent::UseDecremented(_)))
            .count();
        assert_eq!(released_after, 2);
    }

    #[test]
    fn test_identical_update_is_noop() {
        let (platform, graphics) = setup(SimulatedOptions::default());
        let settings = display(10);
        let mut context = create(&platform, &graphics, &settings).unwrap();

        assert_eq!(context.update(&settings).unwrap(), UpdateOutcome::Unchanged);

        // fields outside the selection do not matter in display mode
        let mut unrelated = settings.clone();
        unrelated.application = "com.apple.finder".into();
        assert_eq!(context.update(&unrelated).unwrap(), UpdateOutcome::Unchanged);

        assert_eq!(starts(&platform), 1);
        assert_eq!(stops(&platform), 0);
    }

    #[test]
    fn test_target_change_rebuilds_once() {
        let (platform, graphics) = setup(SimulatedOptions::default());
        let mut context = create(&platform, &graphics, &display(10)).unwrap();
        platform.push_frame(1920, 1080);
        context.video_tick(0.016);

        assert_eq!(context.update(&display(20)).unwrap(), UpdateOutcome::Rebuilt);
        assert_eq!(starts(&platform), 2);
        assert_eq!(stops(&platform), 1);
        assert_eq!(platform.active_streams(), 1);
        assert_eq!((context.width(), context.height()), (0, 0));
        assert_eq!(platform.ledger().live(), 0);

        platform.push_frame(2560, 1440);
        context.video_tick(0.016);
        assert_eq!((context.width(), context.height()), (2560, 1440));
    }

    #[test]
    fn test_cursor_change_rebuilds() {
        let (platform, graphics) = setup(SimulatedOptions::default());
        let mut settings = display(10);
        let mut context = create(&platform, &graphics, &settings).unwrap();

        settings.show_cursor = false;
        assert_eq!(context.update(&settings).unwrap(), UpdateOutcome::Rebuilt);
        assert_eq!(stops(&platform), 1);
    }

    #[test]
    fn test_window_and_application_targets() {
        let (platform, graphics) = setup(SimulatedOptions::default());
        let mut settings = display(10);
        settings.capture_type = CaptureType::Window;
        settings.window = Some(crate::config::WindowSelection {
            id: 102,
            ..Default::default()
        });
        let mut context = create(&platform, &graphics, &settings).unwrap();
        assert_eq!(context.session_state(), Some(SessionState::Running));

        settings.capture_type = CaptureType::Application;
        settings.application = "com.apple.Terminal".into();
        assert_eq!(context.update(&settings).unwrap(), UpdateOutcome::Rebuilt);
        assert_eq!(context.session_state(), Some(SessionState::Running));
    }

    #[test]
    fn test_start_failure_fails_create() {
        let (platform, graphics) = setup(SimulatedOptions {
            fail_start: true,
            ..Default::default()
        });

        let result = create(&platform, &graphics, &display(10));
        assert!(matches!(result, Err(CaptureError::StartFailed(_))));
        assert_eq!(platform.active_streams(), 0);
        assert_eq!(graphics.ledger().samplers_live(), 0);
        assert_eq!(graphics.ledger().vertex_buffers_live(), 0);
    }

    #[test]
    fn test_missing_target_fails_create() {
        let (platform, graphics) = setup(SimulatedOptions::default());

        let result = create(&platform, &graphics, &display(99));
        assert!(matches!(result, Err(CaptureError::DisplayNotFound(99))));
        assert_eq!(platform.count(|e| matches!(e, SimEvent::StreamCreated)), 0);
    }

    #[test]
    fn test_failed_update_leaves_blank_source() {
        let (platform, graphics) = setup(SimulatedOptions::default());
        let mut context = create(&platform, &graphics, &display(10)).unwrap();
        platform.push_frame(1920, 1080);
        context.video_tick(0.016);

        let err = context.update(&display(99)).unwrap_err();
        assert!(err.is_resolution_failure());
        assert_eq!(context.session_state(), None);
        assert_eq!((context.width(), context.height()), (0, 0));
        assert_eq!(platform.active_streams(), 0);

        // the failed selection is remembered; a different one retries
        assert_eq!(context.update(&display(99)).unwrap(), UpdateOutcome::Unchanged);
        assert_eq!(context.update(&display(10)).unwrap(), UpdateOutcome::Rebuilt);
        assert_eq!(platform.active_streams(), 1);
    }

    #[test]
    fn test_allocation_failure_rolls_back() {
        let platform = SimulatedPlatform::new(SimulatedOptions::default()).unwrap();
        let graphics = HeadlessGraphics::new(GraphicsOptions {
            fail_sampler: true,
            ..Default::default()
        });

        let result = create(&platform, &graphics, &display(10));
        assert!(matches!(result, Err(CaptureError::Graphics(_))));
        assert_eq!(platform.count(|e| matches!(e, SimEvent::StreamCreated)), 0);
        assert_eq!(graphics.ledger().scope_depth(), 0);
    }

    #[test]
    fn test_hidden_source_skips_tick() {
        let (platform, graphics) = setup(SimulatedOptions::default());
        let mut context = create(&platform, &graphics, &display(10)).unwrap();

        context.hide();
        platform.push_frame(1920, 1080);
        context.video_tick(0.016);
        assert_eq!(context.width(), 0);
        assert_eq!(graphics.ledger().textures_created(), 0);
        assert_eq!(context.stats().ticks_skipped.load(Ordering::Relaxed), 1);

        context.show();
        context.video_tick(0.016);
        assert_eq!(context.width(), 1920);
    }

    #[test]
    fn test_properties_list_targets() {
        let (platform, graphics) = setup(SimulatedOptions::default());
        let context = create(&platform, &graphics, &display(10)).unwrap();

        let props = context.properties();
        assert_eq!(props.capture_types.len(), 3);
        assert_eq!(props.displays[0].label, "Built-in Display: 1920x1080");
        let windows: Vec<_> = props.windows.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(windows, vec!["[Finder] Downloads", "[Terminal] zsh"]);
        let apps: Vec<_> = props.applications.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(apps, vec!["Finder", "Terminal"]);
        assert!(props.show_cursor);
        assert_eq!(
            platform.count(|e| matches!(e, SimEvent::EnumerationRequested)),
            2
        );
    }

    #[test]
    fn test_defaults_use_primary_display() {
        let platform = SimulatedPlatform::new(SimulatedOptions::default()).unwrap();
        let settings = defaults(&*platform);
        assert_eq!(settings.display, 10);
        assert_eq!(settings.capture_type, CaptureType::Display);
        assert!(settings.show_cursor);
    }

    #[test]
    fn test_live_stream_balances_use_counts() {
        let (platform, graphics) = setup(SimulatedOptions {
            frame_rate: Some(240),
            ..Default::default()
        });
        let mut context = create(&platform, &graphics, &display(20)).unwrap();

        for _ in 0..30 {
            context.video_tick(0.004);
            context.video_render();
            std::thread::sleep(Duration::from_millis(4));
        }
        assert!(graphics.ledger().textures_created() >= 1);

        drop(context);
        assert_eq!(platform.ledger().live(), 0);
        assert_eq!(platform.ledger().underflows(), 0);
    }

    #[test]
    fn test_recycled_surface_skips_rebind() {
        let (platform, graphics) = setup(SimulatedOptions::default());
        let mut context = create(&platform, &graphics, &display(10)).unwrap();
        let surface = platform.ledger().simulated_surface(1920, 1080);

        platform.push_surface(surface.clone());
        context.video_tick(0.016);
        // the platform hands back the buffer that is already bound
        platform.push_surface(surface.clone());
        context.video_tick(0.016);

        let l = graphics.ledger();
        assert_eq!(l.textures_created(), 1);
        assert_eq!(l.rebinds(), 0);
        assert_eq!(context.stats().frames_promoted.load(Ordering::Relaxed), 2);
        assert_eq!(context.stats().texture_rebinds.load(Ordering::Relaxed), 0);
        assert_eq!(surface.use_count(), 1);
        assert_eq!((context.width(), context.height()), (1920, 1080));

        context.destroy();
        assert_eq!(surface.use_count(), 0);
    }

    #[test]
    fn test_stop_failure_does_not_block_release() {
        let (platform, graphics) = setup(SimulatedOptions {
            fail_stop: true,
            ..Default::default()
        });
        let mut context = create(&platform, &graphics, &display(10)).unwrap();
        platform.push_frame(1920, 1080);
        context.video_tick(0.016);
        platform.push_frame(1920, 1080);

        assert_eq!(context.update(&display(20)).unwrap(), UpdateOutcome::Rebuilt);
        assert_eq!(platform.ledger().live(), 0);
        assert_eq!(graphics.ledger().textures_live(), 0);
        assert_eq!(platform.active_streams(), 1);

        platform.push_frame(2560, 1440);
        context.video_tick(0.016);
        drop(context);

        assert_eq!(platform.ledger().live(), 0);
        assert_eq!(platform.ledger().underflows(), 0);
        assert_eq!(graphics.ledger().textures_live(), 0);
        assert_eq!(platform.active_streams(), 0);
    }

    #[test]
    fn test_enumeration_failure_keeps_previous_snapshot() {
        let (platform, graphics) = setup(SimulatedOptions::default());
        let context = create(&platform, &graphics, &display(10)).unwrap();

        platform.configure(|o| o.fail_enumeration = true);
        let props = context.properties();

        assert_eq!(
            platform.count(|e| matches!(e, SimEvent::EnumerationRequested)),
            2
        );
        assert_eq!(props.displays.len(), 2);
        assert_eq!(props.windows.len(), 2);
        assert_eq!(props.applications.len(), 2);
    }

    mod thread_log {
        use std::cell::RefCell;
        use std::sync::Once;

        thread_local! {
            static LINES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
        }

        /// Records messages logged from the calling thread only.
        struct ThreadLogger;

        impl log::Log for ThreadLogger {
            fn enabled(&self, _: &log::Metadata) -> bool {
                true
            }

            fn log(&self, record: &log::Record) {
                LINES.with(|l| l.borrow_mut().push(record.args().to_string()));
            }

            fn flush(&self) {}
        }

        static LOGGER: ThreadLogger = ThreadLogger;
        static INIT: Once = Once::new();

        pub fn install() {
            INIT.call_once(|| {
                if log::set_logger(&LOGGER).is_ok() {
                    log::set_max_level(log::LevelFilter::Info);
                }
            });
            LINES.with(|l| l.borrow_mut().clear());
        }

        pub fn lines() -> Vec<String> {
            LINES.with(|l| l.borrow().clone())
        }
    }

    #[test]
    fn test_failed_create_is_not_reported_destroyed() {
        thread_log::install();
        let (platform, graphics) = setup(SimulatedOptions {
            fail_start: true,
            ..Default::default()
        });

        assert!(create(&platform, &graphics, &display(10)).is_err());
        let lines = thread_log::lines();
        assert!(lines.iter().any(|l| l.contains("failed to start")));
        assert!(!lines.iter().any(|l| l.contains("source destroyed")));
        assert!(!lines.iter().any(|l| l.contains("source created")));

        platform.configure(|o| o.fail_start = false);
        create(&platform, &graphics, &display(10)).unwrap().destroy();
        let lines = thread_log::lines();
        assert!(lines.iter().any(|l| l.contains("source destroyed")));
    }
}
