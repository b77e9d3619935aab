//! # Receiver Error Handling
//!
//! This module defines the `ReceiverError` enum, which represents the error
//! types that can surface from the tuner adapter and from construction-time
//! configuration validation.
//!
//! Per-block soft failures (unknown preamble, CRC mismatch, duplicate
//! packet, short block) are *not* represented here — they are silently
//! discarded by design (see `protocol::validator`) and observed only
//! indirectly through the hop scheduler's miss counter.

use thiserror::Error;

/// Represents the different error types that can occur in the receiver.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// The tuner device could not be opened.
    #[error("failed to open tuner device {index}: {reason}")]
    TunerOpen { index: u32, reason: String },

    /// A tuner control-plane call (set frequency, set sample rate, ...) failed.
    #[error("tuner control error: {0}")]
    TunerControl(String),

    /// The async sample stream ended or failed unexpectedly.
    #[error("tuner sample stream error: {0}")]
    TunerStream(String),

    /// A `PacketConfig` was built from inconsistent parameters.
    #[error("invalid packet configuration: {0}")]
    InvalidConfig(String),

    /// Raw capture file could not be opened or written.
    #[error("capture I/O error: {0}")]
    CaptureIo(#[from] std::io::Error),
}
