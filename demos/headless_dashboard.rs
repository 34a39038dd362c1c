//! Headless dashboard: prints what a camera dashboard would show
//!
//! Run with: cargo run --example headless_dashboard WS_URL API_URL [TOKEN] [CAMERA_ID...]
//!
//! Examples:
//!   cargo run --example headless_dashboard ws://localhost:8000/ws http://localhost:8000
//!   cargo run --example headless_dashboard ws://localhost:8000/ws http://localhost:8000 secret cam-1
//!
//! Every camera id given is started once the dashboard is up. With the
//! `cpal-output` feature, detection cues play on the default audio device.

use camwatch_stream::api::auth_channel;
use camwatch_stream::engine::NoticeLevel;
use camwatch_stream::{
    ApiConfig, AudioSink, AuthState, CameraId, DashboardEvent, Engine, EngineConfig,
    HttpCommandApi, SessionConfig, SharedToken, UserCommand, WsConnector,
};

fn print_usage() {
    eprintln!("Usage: headless_dashboard WS_URL API_URL [TOKEN] [CAMERA_ID...]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  WS_URL       Stream endpoint, e.g. ws://localhost:8000/ws");
    eprintln!("  API_URL      REST base URL, e.g. http://localhost:8000");
    eprintln!("  TOKEN        Bearer token for REST calls (default: demo)");
    eprintln!("  CAMERA_ID    Cameras to start on launch");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("camwatch_stream=info".parse()?)
                .add_directive("headless_dashboard=debug".parse()?),
        )
        .init();

    let session = SessionConfig::with_url(&args[1]);
    let api = HttpCommandApi::new(
        ApiConfig::with_base_url(&args[2]),
        SharedToken::new(args.get(3).map(String::as_str).unwrap_or("demo")),
    )?;
    let cameras: Vec<CameraId> = args.iter().skip(4).map(CameraId::new).collect();

    #[cfg(feature = "cpal-output")]
    let sink = camwatch_stream::audio::CpalSink::open()?;
    #[cfg(not(feature = "cpal-output"))]
    let sink = camwatch_stream::NullSink;

    run(EngineConfig::with_session(session), api, sink, cameras).await;
    Ok(())
}

async fn run<S: AudioSink>(
    config: EngineConfig,
    api: HttpCommandApi<SharedToken>,
    sink: S,
    cameras: Vec<CameraId>,
) {
    let (_auth, auth_rx) = auth_channel(AuthState::SignedIn);
    let (engine, handle) = Engine::new(config, api, WsConnector::new(), sink, auth_rx);
    let mut events = handle.subscribe();
    let engine = tokio::spawn(engine.run());

    // A terminal has no click to unlock audio with
    handle.send(UserCommand::ResumeAudio).await;
    for camera in cameras {
        handle.start(camera).await;
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => print_event(&event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    println!("(skipped {} events)", n);
                }
                Err(_) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                handle.shutdown().await;
                break;
            }
        }
    }

    let _ = engine.await;
}

fn print_event(event: &DashboardEvent) {
    match event {
        DashboardEvent::Rendered {
            camera,
            regions,
            image,
        } => {
            println!(
                "[{}] frame {}x{}, {} clickable regions",
                camera,
                image.width(),
                image.height(),
                regions.len()
            );
        }
        DashboardEvent::Placeholder { camera } => println!("[{}] offline", camera),
        DashboardEvent::DetectionSelected {
            camera, detection, ..
        } => {
            println!(
                "[{}] selected {} ({:.2})",
                camera,
                detection.class_name.as_deref().unwrap_or("?"),
                detection.confidence.unwrap_or_default()
            );
        }
        DashboardEvent::Notice(notice) => {
            let tag = match notice.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Warning => "warn",
                NoticeLevel::Error => "error",
            };
            println!("{}: {}", tag, notice);
        }
        DashboardEvent::StateChanged { .. } => {}
        DashboardEvent::CameraRemoved { camera } => println!("[{}] removed", camera),
        DashboardEvent::ConnectionChanged { connected } => {
            println!("{}", if *connected { "connected" } else { "disconnected" });
        }
    }
}
