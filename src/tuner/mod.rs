//! Tuner hardware abstraction.
//!
//! The receiver core never talks to a radio chip directly; it reads raw
//! interleaved I/Q byte blocks through the [`Tuner`] trait, the same
//! seam the teacher draws around its SDR-adjacent hardware with
//! [`async_trait`] (see `wmbus::radio::radio_driver::RadioDriver`). No
//! concrete hardware driver ships in this crate — `--device` selection and
//! register programming are out of scope — but the trait is the contract a
//! real `rtl-sdr`/`soapysdr` adapter would implement outside it.

pub mod mock;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ReceiverError;

/// Async control-plane and sample-stream interface to a tunable SDR front
/// end. Mirrors the rtl-sdr-style call shape named in spec.md §6: open by
/// device index, configure center frequency/sample rate/gain/correction,
/// then stream raw bytes asynchronously until cancelled.
#[async_trait]
pub trait Tuner: Send {
    /// Open device `index`. Returns `Self`, not a handle, matching rtl-sdr's
    /// exclusive-ownership-on-open semantics.
    async fn open(index: u32) -> Result<Self, ReceiverError>
    where
        Self: Sized;

    async fn set_center_freq(&mut self, hz: u32) -> Result<(), ReceiverError>;
    async fn set_sample_rate(&mut self, hz: u32) -> Result<(), ReceiverError>;
    async fn set_tuner_gain_mode(&mut self, auto: bool) -> Result<(), ReceiverError>;
    async fn set_freq_correction(&mut self, ppm: i32) -> Result<(), ReceiverError>;

    /// Discard any samples the device buffered before streaming began, so
    /// the first block read after a retune doesn't carry stale samples from
    /// the previous channel.
    async fn reset_buffer(&mut self) -> Result<(), ReceiverError>;

    /// Stream raw interleaved I/Q bytes in `block_bytes`-sized chunks onto
    /// `tx` until [`Tuner::cancel_async`] is called or the device errors.
    /// Runs until cancelled; the caller drives it as its own task.
    async fn read_async(
        &mut self,
        tx: mpsc::Sender<Vec<u8>>,
        block_bytes: usize,
    ) -> Result<(), ReceiverError>;

    /// Request that a concurrently running `read_async` stop at the next
    /// block boundary. Synchronous: the underlying hardware call (or, for
    /// `MockTuner`, an atomic flag) is fire-and-forget.
    fn cancel_async(&mut self);

    async fn close(self) -> Result<(), ReceiverError>
    where
        Self: Sized;
}

pub use mock::MockTuner;
