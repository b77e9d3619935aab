use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use hopcatcher::capture::{MessageCapture, RawCapture};
use hopcatcher::config::ReceiverConfig;
use hopcatcher::logging::{log_error, log_info};
use hopcatcher::tuner::{MockTuner, Tuner};
use hopcatcher::{init_logger, pipeline};

/// Frequency-hopping FSK weather-station telemetry receiver.
///
/// No production tuner backend ships with this crate (hardware register
/// programming is out of scope); the CLI runs against the built-in
/// `MockTuner`, which streams silence once any queued fixture bytes are
/// exhausted. Wiring a real SDR backend means implementing `Tuner` and
/// swapping the constructor below.
#[derive(Parser)]
#[command(name = "hopcatcher")]
#[command(about = "Frequency-hopping FSK weather-station telemetry receiver")]
struct Cli {
    /// Station ID to report messages for; others are received but discarded.
    /// Overrides `--config`'s `station_id` when both are given.
    #[arg(long = "id")]
    station_id: Option<u8>,

    /// Enable verbose (debug-level) logging to standard error. Overrides
    /// `--config`'s `verbose` when set.
    #[arg(short = 'v', long, action = clap::ArgAction::SetTrue)]
    verbose: bool,

    /// Optional JSON file providing a full `ReceiverConfig` (protocol
    /// timing constants, station ID, verbosity); `--id`/`-v` take
    /// precedence over the file's values when given.
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Optional path to persist raw demodulator bytes.
    #[arg(long = "capture-raw")]
    capture_raw: Option<PathBuf>,

    /// Optional path to persist validated message frames.
    #[arg(long = "capture-messages")]
    capture_messages: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            // Logger isn't initialized yet on this path; a config-load
            // failure is reported on stderr directly rather than dropped.
            eprintln!("fatal error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    init_logger(config.verbose);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_error(&format!("fatal error: {err}"));
            ExitCode::FAILURE
        }
    }
}

/// Build the effective `ReceiverConfig`: `--config`'s file (or `Default`),
/// with `--id`/`-v` applied on top when explicitly given.
fn build_config(cli: &Cli) -> anyhow::Result<ReceiverConfig> {
    let mut config = match &cli.config {
        Some(path) => ReceiverConfig::from_json_file(path)
            .with_context(|| format!("failed to load config file {path:?}"))?,
        None => ReceiverConfig::default(),
    };
    if let Some(station_id) = cli.station_id {
        config.station_id = station_id;
    }
    if cli.verbose {
        config.verbose = true;
    }
    Ok(config)
}

async fn run(cli: Cli, config: ReceiverConfig) -> anyhow::Result<()> {
    let raw_capture = match cli.capture_raw {
        Some(path) => Some(
            RawCapture::open(path)
                .await
                .context("failed to open raw capture file")?,
        ),
        None => None,
    };
    let message_capture = match cli.capture_messages {
        Some(path) => Some(
            MessageCapture::open(path)
                .await
                .context("failed to open message capture file")?,
        ),
        None => None,
    };

    let tuner = MockTuner::open(0)
        .await
        .context("failed to open tuner device 0")?;

    let raw_tx = raw_capture.as_ref().map(|c| c.sender.clone());
    let station_id = config.station_id;
    let mut pipeline =
        pipeline::spawn(tuner, config, raw_tx).context("failed to start pipeline")?;

    log_info(&format!("receiver started, station id {station_id}"));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            message = pipeline.messages.recv() => {
                match message {
                    Some(message) => {
                        log_info(&format!("{message:?}"));
                        if let Some(capture) = &message_capture {
                            let _ = capture.sender.send(message).await;
                        }
                    }
                    None => break,
                }
            }
            _ = &mut shutdown => {
                log_info("shutdown signal received");
                break;
            }
        }
    }

    pipeline.shutdown().await;
    if let Some(capture) = raw_capture {
        capture.join().await.context("failed to flush raw capture")?;
    }
    if let Some(capture) = message_capture {
        capture
            .join()
            .await
            .context("failed to flush message capture")?;
    }

    Ok(())
}
