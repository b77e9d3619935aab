//! Worker loop, sample producer and retuner tasks.
//!
//! Three concurrent actors, matching spec.md §5 exactly:
//!
//! - [`run_producer`] drives `Tuner::read_async`, forwarding raw blocks onto
//!   the sample channel (the "pipe").
//! - [`run_retuner`] consumes `Hop` decisions from a second channel and is
//!   the only task that calls `Tuner::set_center_freq`/`reset_buffer`, so a
//!   retune can never interleave with the producer mid-block.
//! - [`run_worker`] owns the `Demodulator` and `HopScheduler` on a single
//!   task: it demodulates each incoming block, validates any packets found,
//!   reports validated messages for the caller's station ID, and drives the
//!   scheduler's dwell-timeout/success transitions.
//!
//! `spawn` wires the three together with `tokio::sync::mpsc` channels and a
//! `tokio::sync::watch` shutdown flag, the way the teacher wires its serial
//! read/write tasks with channels rather than shared locks wherever it can.

use std::sync::Arc;

use num_complex::Complex64;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::config::ReceiverConfig;
use crate::dsp::Demodulator;
use crate::error::ReceiverError;
use crate::hop::{Hop, HopScheduler};
use crate::logging::{log_debug, log_warn};
use crate::protocol::{validate, Message};
use crate::tuner::Tuner;

const SAMPLE_CHANNEL_CAPACITY: usize = 8;
const HOP_CHANNEL_CAPACITY: usize = 4;
const MESSAGE_CHANNEL_CAPACITY: usize = 32;

/// Handles to a running pipeline: a channel of validated messages (already
/// filtered to the configured station ID) and a shutdown switch.
pub struct Pipeline {
    pub messages: mpsc::Receiver<Message>,
    shutdown: watch::Sender<bool>,
    producer: JoinHandle<()>,
    retuner: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl Pipeline {
    /// Signal all three tasks to stop at their next block/hop/select
    /// boundary and wait for them to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.producer.await;
        let _ = self.retuner.await;
        let _ = self.worker.await;
    }
}

/// Build and start the pipeline for an already-opened tuner.
///
/// `raw_tx`, if given, receives a copy of every raw block the worker reads
/// before it's consumed — the tap point for `capture::RawCapture`.
pub fn spawn<T: Tuner + 'static>(
    tuner: T,
    config: ReceiverConfig,
    raw_tx: Option<mpsc::Sender<Vec<u8>>>,
) -> Result<Pipeline, ReceiverError> {
    let packet_config = config.packet_config()?;
    let block_bytes = packet_config.block_size * 2;

    let tuner = Arc::new(Mutex::new(tuner));
    let (sample_tx, sample_rx) = mpsc::channel::<Vec<u8>>(SAMPLE_CHANNEL_CAPACITY);
    let (hop_tx, hop_rx) = mpsc::channel::<Hop>(HOP_CHANNEL_CAPACITY);
    let (message_tx, message_rx) = mpsc::channel::<Message>(MESSAGE_CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let producer = tokio::spawn(run_producer(
        tuner.clone(),
        sample_tx,
        block_bytes,
        shutdown_rx.clone(),
    ));
    let retuner = tokio::spawn(run_retuner(tuner, hop_rx, shutdown_rx.clone()));
    let worker = tokio::spawn(run_worker(
        packet_config,
        config.station_id,
        sample_rx,
        hop_tx,
        message_tx,
        raw_tx,
        shutdown_rx,
    ));

    Ok(Pipeline {
        messages: message_rx,
        shutdown: shutdown_tx,
        producer,
        retuner,
        worker,
    })
}

async fn run_producer<T: Tuner>(
    tuner: Arc<Mutex<T>>,
    sample_tx: mpsc::Sender<Vec<u8>>,
    block_bytes: usize,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        let result = {
            let mut guard = tuner.lock().await;
            guard.read_async(sample_tx.clone(), block_bytes).await
        };
        if let Err(err) = result {
            log_warn(&format!("tuner sample stream ended: {err}"));
            return;
        }
        // read_async returns once cancelled (by a retune) or on stream end;
        // either way, loop back so a cancelled-for-retune stream resumes.
        if sample_tx.is_closed() {
            return;
        }
    }
}

async fn run_retuner<T: Tuner>(
    tuner: Arc<Mutex<T>>,
    mut hop_rx: mpsc::Receiver<Hop>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            hop = hop_rx.recv() => {
                match hop {
                    Some(hop) => {
                        let mut guard = tuner.lock().await;
                        guard.cancel_async();
                        if let Err(err) = guard.set_center_freq(hop.channel_freq_hz).await {
                            log_warn(&format!(
                                "failed to retune to channel {}: {err}",
                                hop.channel_idx
                            ));
                            continue;
                        }
                        if let Err(err) = guard.reset_buffer().await {
                            log_warn(&format!("failed to reset tuner buffer after retune: {err}"));
                        }
                        log_debug(&format!(
                            "retuned to channel {} ({} Hz), freq_error_hz={:.1}",
                            hop.channel_idx, hop.channel_freq_hz, hop.freq_error_hz
                        ));
                    }
                    None => return,
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}

async fn run_worker(
    packet_config: crate::config::PacketConfig,
    station_id: u8,
    mut sample_rx: mpsc::Receiver<Vec<u8>>,
    hop_tx: mpsc::Sender<Hop>,
    message_tx: mpsc::Sender<Message>,
    raw_tx: Option<mpsc::Sender<Vec<u8>>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let sample_rate_hz = packet_config.sample_rate;
    let symbol_length = packet_config.symbol_length;
    let mut demod = Demodulator::new(packet_config);
    let mut scheduler = HopScheduler::new(station_id);

    let (initial_hop, initial_dwell) = scheduler.start();
    if hop_tx.send(initial_hop).await.is_err() {
        return;
    }
    let mut deadline = Instant::now() + initial_dwell;

    loop {
        tokio::select! {
            block = sample_rx.recv() => {
                let Some(block) = block else { return };
                if let Some(raw_tx) = &raw_tx {
                    let _ = raw_tx.send(block.clone()).await;
                }
                for packet in demod.demodulate(&block) {
                    let tail_start = packet.idx + 8 * symbol_length;
                    let tail_end = packet.idx + 24 * symbol_length + 1;
                    let history = demod.iq_history();
                    if tail_end > history.len() {
                        log_debug(&format!(
                            "packet at idx {} too close to buffer edge for freq-error tail",
                            packet.idx
                        ));
                        continue;
                    }
                    let tail: &[Complex64] = &history[tail_start..tail_end];

                    match validate(&packet, tail, sample_rate_hz) {
                        Some(message) => {
                            let delta = message.freq_error_hz;
                            let (hop, dwell) = scheduler.on_packet_validated(delta);
                            deadline = Instant::now() + dwell;
                            if hop_tx.send(hop).await.is_err() {
                                return;
                            }
                            if message.station_id == station_id
                                && message_tx.send(message).await.is_err()
                            {
                                return;
                            }
                        }
                        None => log_debug(&format!("CRC check failed for packet at idx {}", packet.idx)),
                    }
                }
            }
            _ = sleep_until(deadline) => {
                let (hop, dwell) = scheduler.on_dwell_timeout();
                deadline = Instant::now() + dwell;
                if hop_tx.send(hop).await.is_err() {
                    return;
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}
