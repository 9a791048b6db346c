//! Headless driver: upload three images, mark them and compare.
//!
//! ```bash
//! facemark reference.jpg candidate_a.jpg candidate_b.jpg --auto --frames out/
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use web_time::Instant;

use facemark::{AppConfig, LogLevel, Session, SlotRole};
use facemark_api::HttpBackend;

#[derive(Parser)]
#[command(name = "facemark")]
#[command(about = "Mark facial feature points on three images and score the comparison")]
struct Args {
    /// Reference image
    reference: PathBuf,

    /// First comparison image
    compare_a: PathBuf,

    /// Second comparison image
    compare_b: PathBuf,

    /// Configuration file (defaults to the per-user config path)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the backend base URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Run automatic feature extraction after face detection
    #[arg(long)]
    auto: bool,

    /// Write each slot's rendered frame as PNG into this directory
    #[arg(long)]
    frames: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    let level_from_env = init_logging();

    let config = match &args.config {
        Some(path) => match AppConfig::load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => AppConfig::load_from_default_path().unwrap_or_default(),
    };
    if !level_from_env {
        log::set_max_level(config.preferences.log_level.to_level_filter());
    }

    if let Err(e) = run(&args, config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Start logging before the config is read so load failures are reported.
///
/// `RUST_LOG` wins when set; otherwise the default level holds until the
/// configured one is known. Returns whether `RUST_LOG` was set.
fn init_logging() -> bool {
    let level_from_env = std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some();
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Trace)
        .parse_default_env()
        .init();
    if !level_from_env {
        log::set_max_level(LogLevel::default().to_level_filter());
    }
    level_from_env
}

fn run(args: &Args, mut config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(url) = &args.backend_url {
        config.backend.base_url = url.clone();
    }
    let backend = Arc::new(HttpBackend::new(
        config.backend.base_url.clone(),
        config.backend.timeout(),
    ));
    log::info!("Using backend at {}", backend.base_url());

    let mut session = Session::new(backend, &config)?;

    for (role, path) in [
        (SlotRole::Reference, &args.reference),
        (SlotRole::CompareA, &args.compare_a),
        (SlotRole::CompareB, &args.compare_b),
    ] {
        session.upload_file(role, path)?;
    }

    let detection = session.detect_faces()?;
    println!(
        "Face detection: {} of {} images processed",
        detection.success_count(),
        detection.total()
    );
    for (role, reason) in &detection.failed {
        println!("  {}: {}", role, reason);
    }

    if args.auto {
        let report = session.extract_with_defaults()?;
        println!("{}", report.summary("Automatic extraction"));
        for (role, reason) in &report.failed {
            println!("  {}: {}", role, reason);
        }
    }

    if let Some(dir) = &args.frames {
        wait_for_frames(&mut session, Duration::from_secs(10));
        std::fs::create_dir_all(dir)?;
        for role in SlotRole::all() {
            if let Some(frame) = session.frame(*role) {
                let path = dir.join(format!("{}.png", role));
                frame.image.save(&path)?;
                println!("Wrote {}", path.display());
            }
        }
    }

    for stats in session.statistics() {
        println!("{}", stats);
    }

    let gate = session.gate();
    println!("Status: {}", gate);
    if gate.is_ready() {
        let result = session.compare()?;
        println!(
            "Closer image: {:?} (scores {:.4} / {:.4}, {:.2}s)",
            result.closer_image, result.image1_score, result.image2_score, result.execution_time
        );
    }

    Ok(())
}

fn wait_for_frames(session: &mut Session, timeout: Duration) {
    let start = Instant::now();
    while !session.is_render_idle() {
        session.poll_render();
        if start.elapsed() > timeout {
            log::warn!("Timed out waiting for frames to render");
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
}
