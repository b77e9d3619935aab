//! # hopcatcher
//!
//! Receiver for a frequency-hopping FSK sub-GHz weather-station telemetry
//! protocol: a sliding-DFT demodulator, symbol-phase slicer and preamble
//! searcher recover bits from raw I/Q samples with no external timing
//! reference; a CRC-validated packet extractor decodes sensor readings; a
//! hop scheduler tracks the transmitter's 51-channel hop pattern and keeps
//! the tuner retuned to it.
//!
//! ## Usage
//!
//! ```no_run
//! use hopcatcher::{config::ReceiverConfig, tuner::MockTuner, tuner::Tuner};
//!
//! # async fn run() -> Result<(), hopcatcher::ReceiverError> {
//! let tuner = MockTuner::open(0).await?;
//! let config = ReceiverConfig::default();
//! let mut pipeline = hopcatcher::pipeline::spawn(tuner, config, None)?;
//! if let Some(message) = pipeline.messages.recv().await {
//!     println!("{message:?}");
//! }
//! pipeline.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! The `dsp` and `protocol` modules have no dependency on any particular
//! radio hardware — that boundary is the [`tuner::Tuner`] trait — so they
//! can be exercised standalone, as the unit tests throughout this crate do.

pub mod capture;
pub mod config;
pub mod constants;
pub mod dsp;
pub mod error;
pub mod hop;
pub mod logging;
pub mod pipeline;
pub mod protocol;
pub mod tuner;
pub mod util;

pub use config::{PacketConfig, ReceiverConfig};
pub use error::ReceiverError;
pub use logging::init_logger;
pub use pipeline::Pipeline;
pub use protocol::Message;
