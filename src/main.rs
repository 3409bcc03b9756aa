//! Pushkodi - forwards Pushbullet pushes to Kodi.
//!
//! Reads Pushbullet stream frames from stdin, one JSON object per line, and
//! dispatches each push to Kodi.

use clap::Parser;
use pushkodi::{
    process_frame, CatalogLocalizer, Config, FileLogger, FrameOutcome, Logger, MessageDispatcher,
    NotifierKind,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "pushkodi")]
#[command(author, version, about)]
#[command(about = "Forwards Pushbullet pushes to Kodi")]
struct Cli {
    /// Path to the configuration file (overrides auto-detection)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also log debug entries
    #[arg(short, long)]
    debug: bool,

    /// Log file (defaults to /tmp/pushkodi.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log to stderr instead of a file
    #[arg(long, conflicts_with = "log_file")]
    stderr: bool,

    /// List available notifiers
    #[arg(long)]
    list_notifiers: bool,

    /// Load the configuration, print a summary and exit
    #[arg(long)]
    check_config: bool,
}

/// Frame counts for the end-of-stream summary.
#[derive(Default)]
struct StreamStats {
    dispatched: usize,
    idle: usize,
    invalid: usize,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // List notifiers if requested
    if cli.list_notifiers {
        list_available_notifiers();
        return;
    }

    let log_path = if cli.stderr {
        None
    } else {
        Some(cli.log_file.clone().unwrap_or_else(|| PathBuf::from("/tmp/pushkodi.log")))
    };
    let logger = Arc::new(FileLogger::new(log_path, cli.debug));

    logger.info("Pushkodi starting");

    // Resolve config file path
    let config_path = match &cli.config {
        Some(path) => {
            logger.debug(&format!("Using config from CLI arg: {:?}", path));
            path.clone()
        }
        None => {
            let resolved = resolve_config_path();
            logger.debug(&format!("Auto-detected config: {:?}", resolved));
            resolved
        }
    };

    // Load configuration (secrets are resolved automatically)
    let config = match Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            logger.error(&format!("Failed to load config: {}", e));
            eprintln!("pushkodi: failed to load config from {:?}: {}", config_path, e);
            process::exit(1);
        }
    };

    if cli.check_config {
        println!("Config OK: {:?}", config);
        return;
    }

    logger.info(&format!(
        "Loaded config: Kodi at {}, {} commands, notifier {}",
        config.kodi.url,
        config.commands.len(),
        config.notifier.name()
    ));

    let rpc = Arc::new(config.kodi.client());
    let dispatcher = MessageDispatcher::new(
        config.dispatcher_settings(),
        rpc.clone(),
        config.notifier.build(rpc),
        logger.clone(),
        Arc::new(CatalogLocalizer::new(config.string_overrides())),
    );

    let stats = run_stream(&dispatcher).await;

    logger.info(&format!(
        "Stream processed: {} pushes, {} idle frames, {} invalid frames",
        stats.dispatched, stats.idle, stats.invalid
    ));
}

/// Dispatches frames from stdin, in arrival order, until EOF or a read error.
async fn run_stream(dispatcher: &MessageDispatcher) -> StreamStats {
    let mut stats = StreamStats::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    dispatcher.on_open();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match process_frame(&line, dispatcher).await {
                    FrameOutcome::Dispatched(_) => stats.dispatched += 1,
                    FrameOutcome::Idle => stats.idle += 1,
                    FrameOutcome::Invalid(_) => stats.invalid += 1,
                }
            }
            Ok(None) => break,
            Err(e) => {
                dispatcher.on_error(&format!("Error reading stream: {}", e)).await;
                break;
            }
        }
    }
    dispatcher.on_close();

    stats
}

/// Resolve the config file path.
///
/// Resolution order:
/// 1. $XDG_CONFIG_HOME/pushkodi/config.json (if XDG_CONFIG_HOME is set)
/// 2. ~/.config/pushkodi/config.json
fn resolve_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join("pushkodi/config.json");
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config/pushkodi/config.json")
}

fn list_available_notifiers() {
    println!("Available notifiers:");
    for kind in NotifierKind::all() {
        println!("  - {}", kind.name());
    }
}
