//! In-memory [`Tuner`] for integration tests, grounded on the teacher's
//! `mbus::serial_mock::MockSerialPort`: an `Arc<Mutex<VecDeque<u8>>>` queue
//! standing in for the device's sample FIFO, fed by the test before
//! `read_async` is called.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::Tuner;
use crate::error::ReceiverError;

/// A `Tuner` backed by a pre-loaded in-memory byte queue instead of
/// hardware. Center frequency, sample rate, gain mode and frequency
/// correction calls are recorded but have no physical effect; `read_async`
/// drains `rx_buffer` in `block_bytes` chunks, padding the final partial
/// chunk with zero bytes (silence) rather than ending the stream early, so
/// tests can exercise several full demodulation calls from one fixture.
#[derive(Clone)]
pub struct MockTuner {
    index: u32,
    pub rx_buffer: Arc<Mutex<VecDeque<u8>>>,
    pub center_freq_hz: Arc<Mutex<Option<u32>>>,
    pub sample_rate_hz: Arc<Mutex<Option<u32>>>,
    pub freq_correction_ppm: Arc<Mutex<Option<i32>>>,
    cancelled: Arc<AtomicBool>,
}

impl MockTuner {
    /// Queue additional raw bytes to be streamed out by `read_async`.
    pub fn queue_samples(&self, data: &[u8]) {
        self.rx_buffer.lock().unwrap().extend(data.iter().copied());
    }

    pub fn device_index(&self) -> u32 {
        self.index
    }
}

#[async_trait]
impl Tuner for MockTuner {
    async fn open(index: u32) -> Result<Self, ReceiverError> {
        Ok(MockTuner {
            index,
            rx_buffer: Arc::new(Mutex::new(VecDeque::new())),
            center_freq_hz: Arc::new(Mutex::new(None)),
            sample_rate_hz: Arc::new(Mutex::new(None)),
            freq_correction_ppm: Arc::new(Mutex::new(None)),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    async fn set_center_freq(&mut self, hz: u32) -> Result<(), ReceiverError> {
        *self.center_freq_hz.lock().unwrap() = Some(hz);
        Ok(())
    }

    async fn set_sample_rate(&mut self, hz: u32) -> Result<(), ReceiverError> {
        *self.sample_rate_hz.lock().unwrap() = Some(hz);
        Ok(())
    }

    async fn set_tuner_gain_mode(&mut self, _auto: bool) -> Result<(), ReceiverError> {
        Ok(())
    }

    async fn set_freq_correction(&mut self, ppm: i32) -> Result<(), ReceiverError> {
        *self.freq_correction_ppm.lock().unwrap() = Some(ppm);
        Ok(())
    }

    async fn reset_buffer(&mut self) -> Result<(), ReceiverError> {
        self.rx_buffer.lock().unwrap().clear();
        Ok(())
    }

    async fn read_async(
        &mut self,
        tx: mpsc::Sender<Vec<u8>>,
        block_bytes: usize,
    ) -> Result<(), ReceiverError> {
        self.cancelled.store(false, Ordering::SeqCst);
        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                return Ok(());
            }

            let mut block = vec![127u8; block_bytes];
            {
                let mut rx = self.rx_buffer.lock().unwrap();
                let available = rx.len().min(block_bytes);
                for slot in block.iter_mut().take(available) {
                    *slot = rx.pop_front().expect("checked available above");
                }
            }

            if tx.send(block).await.is_err() {
                // Receiver dropped: stop streaming.
                return Ok(());
            }
        }
    }

    fn cancel_async(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    async fn close(self) -> Result<(), ReceiverError> {
        Ok(())
    }
}
