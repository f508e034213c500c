mod cli;
mod clipboard;
mod command;
mod console;
mod detector;

use crate::cli::Cli;
use crate::clipboard::CommandClipboard;
use clap::Parser;
use lyriclip_core::{
    CoreError, DemoDetector, LyricEmission, LyriclipConfig, LyricsCache, LyricsFetcher,
    PlaybackDetector, PlaybackTracker, Scheduler,
};
use lyriclip_lyrics_lrclib::LrclibProvider;
use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config_path();

    // Initialize logging with optional file output
    // Check config for logging.enabled before full config load
    init_tracing(check_file_logging_enabled(&config_path));

    let mut config = match LyriclipConfig::load_or_create(Some(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    cli.apply_overrides(&mut config);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(&cli, &config));

    // The console's stdin read blocks a worker thread until the next line
    runtime.shutdown_timeout(Duration::from_millis(250));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: &LyriclipConfig) -> Result<(), CoreError> {
    let detector: Box<dyn PlaybackDetector> = if cli.demo {
        let identity = config.demo_identity();
        info!("Demo mode: simulating {}", identity);
        Box::new(DemoDetector::new(identity))
    } else {
        detector::detect().await?
    };
    let sink = clipboard::select_sink(CommandClipboard::detect(), config.clipboard.enabled)?;

    let provider = Arc::new(LrclibProvider::new()?);
    let fetcher = LyricsFetcher::new(
        Arc::new(LyricsCache::new()),
        provider,
        config.fetch_timeout(),
    );
    let settings = Arc::new(config.settings());
    let tracker = PlaybackTracker::new(fetcher, Arc::clone(&settings));

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();
    let scheduler = Scheduler::new(
        detector,
        tracker,
        sink,
        Some(cancel_token.clone()),
    );
    let handle = scheduler.handle();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_handle = handle.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_handle.stop();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    tokio::spawn(log_emissions(scheduler.subscribe()));
    tokio::spawn(console::run(
        settings,
        handle,
        scheduler.status(),
        cancel_token,
    ));
    info!("{}", console::HELP);

    if let Err(e) = scheduler.start().await {
        error!("Scheduler task failed: {e}");
    }
    info!("Shutdown complete");
    Ok(())
}

fn check_file_logging_enabled(config_path: &Path) -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let Ok(content) = std::fs::read_to_string(config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest_retry=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer();

    if file_logging_enabled {
        let log_path = lyriclip_core::paths::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

async fn log_emissions(mut rx: broadcast::Receiver<LyricEmission>) {
    loop {
        match rx.recv().await {
            Ok(emission) => {
                debug!(
                    "Emitted {:?} at {}ms",
                    emission.text,
                    emission.raw_position.as_millis()
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Emission channel closed");
                break;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                info!("Missed {} lyric emissions", n);
            }
        }
    }
}
