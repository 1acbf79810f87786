use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use screencast_source::assets::{HOST_FRAME_RATE, SIMULATED_FRAME_RATE, TARGET_OS};
use screencast_source::capture::CapturePlatform;
use screencast_source::config::{CaptureType, SourceSettings, WindowSelection};
use screencast_source::simulated::{
    GraphicsOptions, HeadlessGraphics, SimulatedOptions, SimulatedPlatform,
};
use screencast_source::source::{self, CaptureContext};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use std::{panic, process};

fn main() {
    tracing_subscriber::fmt::init();

    let matches = Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("type")
                .short('t')
                .long("type")
                .value_name("TYPE")
                .help("What to capture.")
                .value_parser(["display", "window", "application"])
                .ignore_case(true)
                .default_value("display"),
        )
        .arg(
            Arg::new("display")
                .short('d')
                .long("display")
                .value_name("DISPLAY ID")
                .help("Display to capture, defaults to the primary display.")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("window")
                .short('w')
                .long("window")
                .value_name("WINDOW ID")
                .help("Window to capture in window mode.")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("application")
                .short('a')
                .long("application")
                .value_name("BUNDLE ID")
                .help("Application to capture in application mode."),
        )
        .arg(
            Arg::new("hide-cursor")
                .long("hide-cursor")
                .help("Do not draw the cursor into captured frames.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("settings")
                .short('s')
                .long("settings")
                .value_name("JSON")
                .help("Source settings as the host would store them; overrides the flags above."),
        )
        .arg(
            Arg::new("ticks")
                .short('n')
                .long("ticks")
                .value_name("TICKS")
                .help("Number of host video ticks to run, 0 to run until interrupted.")
                .value_parser(value_parser!(u64))
                .default_value("600"),
        )
        .arg(
            Arg::new("fps")
                .long("fps")
                .value_name("FPS")
                .help("Frame rate of the simulated capture stream [default: 30].")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("Print the capturable displays, windows and applications and exit.")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    // kill the main thread as soon as a secondary thread panics
    let orig_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        process::exit(105);
    }));

    if let Err(e) = run(&matches) {
        log::error!("{:#}", e);
        process::exit(1);
    }
}

fn settings_from_args(matches: &ArgMatches, platform: &SimulatedPlatform) -> Result<SourceSettings> {
    if let Some(json) = matches.get_one::<String>("settings") {
        return SourceSettings::from_json(json);
    }

    let mut settings = source::defaults(platform);
    settings.capture_type = match matches
        .get_one::<String>("type")
        .map(|t| t.to_lowercase())
        .as_deref()
    {
        Some("window") => CaptureType::Window,
        Some("application") => CaptureType::Application,
        _ => CaptureType::Display,
    };
    if let Some(display) = matches.get_one::<u32>("display") {
        settings.display = *display;
    }
    if let Some(window) = matches.get_one::<u32>("window") {
        settings.window = Some(WindowSelection {
            id: *window,
            ..Default::default()
        });
    }
    if let Some(application) = matches.get_one::<String>("application") {
        settings.application = application.clone();
    }
    settings.show_cursor = !matches.get_flag("hide-cursor");
    Ok(settings)
}

fn run(matches: &ArgMatches) -> Result<()> {
    let fps = matches.get_one::<u32>("fps").copied().unwrap_or(SIMULATED_FRAME_RATE);
    let ticks = matches.get_one::<u64>("ticks").copied().unwrap_or_default();

    let platform = SimulatedPlatform::new(SimulatedOptions {
        frame_rate: Some(fps),
        ..Default::default()
    })
    .context("failed to start the simulated capture platform")?;
    let graphics = HeadlessGraphics::new(GraphicsOptions::default());

    let settings = settings_from_args(matches, &platform)?;
    log::info!(
        "Capturing on {} (primary display {}): {}",
        TARGET_OS,
        platform.primary_display_id(),
        settings.to_json()?
    );

    let mut context = CaptureContext::create(&settings, Arc::clone(&platform), Arc::clone(&graphics))
        .context("failed to create capture source")?;

    if matches.get_flag("list") {
        let properties = serde_json::to_string_pretty(&context.properties())?;
        println!("{}", properties);
        return Ok(());
    }

    // gracefully stop the loop when receiving SIGINT, SIGTERM, or SIGHUP
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .context("Error setting Ctrl-C handler")?;

    let interval = Duration::from_secs_f64(1.0 / HOST_FRAME_RATE as f64);
    let started = Instant::now();
    let mut last = started;
    let mut executed = 0u64;

    while running.load(Ordering::SeqCst) && (ticks == 0 || executed < ticks) {
        let deadline = last + interval;
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        let now = Instant::now();
        context.video_tick((now - last).as_secs_f32());
        context.video_render();
        last = now;
        executed += 1;
    }

    log::info!(
        "Ran {} ticks in {:.2?}, source size {}x{}",
        executed,
        started.elapsed(),
        context.width(),
        context.height()
    );
    context.stats().log_summary(settings.capture_type.label());
    context.destroy();

    let ledger = platform.ledger();
    log::info!(
        "Buffers: {} acquired, {} released, {} outstanding; {} textures created, {} rebinds, {} draws",
        ledger.increments(),
        ledger.decrements(),
        ledger.live(),
        graphics.ledger().textures_created(),
        graphics.ledger().rebinds(),
        graphics.ledger().draws()
    );
    Ok(())
}
