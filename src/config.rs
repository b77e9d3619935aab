//! Receiver configuration.
//!
//! [`PacketConfig`] derives the fixed frame-timing constants (sample rate,
//! buffer sizing, preamble byte pattern) from the four protocol inputs; it
//! is built once at startup and never mutated afterward. [`ReceiverConfig`]
//! is the ambient, serializable wrapper around those inputs plus the
//! station-ID filter and verbosity flag, so a future config file or test
//! fixture can construct a receiver without going through the CLI.

use serde::{Deserialize, Serialize};

use crate::constants::{
    BIT_RATE, BLOCK_SIZE, PACKET_SYMBOLS, PREAMBLE, PREAMBLE_SYMBOLS, SYMBOL_LENGTH,
};
use crate::error::ReceiverError;

/// Fixed processing-block size in samples. Not a derived field: the spec
/// names this a constant independent of bit rate or symbol length.
pub const BLOCK_SIZE_SAMPLES: usize = BLOCK_SIZE;

/// Immutable, derived packet-timing configuration.
///
/// Built once via [`PacketConfig::new`] and shared (by value or `Arc`, the
/// struct is cheap to clone) across the demodulator and validator for the
/// lifetime of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketConfig {
    /// Bits per second on the air.
    pub bit_rate: u32,
    /// Samples per symbol.
    pub symbol_length: usize,
    /// Preamble symbol count.
    pub preamble_symbols: usize,
    /// Total packet symbol count, header through CRC trailer.
    pub packet_symbols: usize,
    /// Preamble bit pattern, one byte (`0` or `1`) per symbol.
    pub preamble_pattern: Vec<u8>,
    /// Derived: `bit_rate * symbol_length`.
    pub sample_rate: u32,
    /// Fixed processing block size, in samples.
    pub block_size: usize,
    /// Derived: `ceil(packet_symbols * symbol_length / block_size) *
    /// block_size + block_size`.
    pub buffer_len: usize,
}

impl PacketConfig {
    /// Build a `PacketConfig` from the four protocol inputs.
    ///
    /// Returns [`ReceiverError::InvalidConfig`] if the preamble string
    /// contains characters other than `'0'`/`'1'`, or if any of the
    /// rate/length/count inputs is zero (a zero would make the derived
    /// buffer sizing degenerate).
    pub fn new(
        bit_rate: u32,
        symbol_length: usize,
        preamble_symbols: usize,
        packet_symbols: usize,
        preamble_bits: &str,
    ) -> Result<Self, ReceiverError> {
        if bit_rate == 0 || symbol_length == 0 || preamble_symbols == 0 || packet_symbols == 0 {
            return Err(ReceiverError::InvalidConfig(
                "bit_rate, symbol_length, preamble_symbols and packet_symbols must be non-zero"
                    .to_string(),
            ));
        }
        if preamble_bits.len() != preamble_symbols {
            return Err(ReceiverError::InvalidConfig(format!(
                "preamble string length {} does not match preamble_symbols {preamble_symbols}",
                preamble_bits.len()
            )));
        }
        let mut preamble_pattern = Vec::with_capacity(preamble_bits.len());
        for c in preamble_bits.chars() {
            match c {
                '0' => preamble_pattern.push(0u8),
                '1' => preamble_pattern.push(1u8),
                other => {
                    return Err(ReceiverError::InvalidConfig(format!(
                        "preamble string contains non-bit character {other:?}"
                    )))
                }
            }
        }

        let sample_rate = bit_rate
            .checked_mul(symbol_length as u32)
            .ok_or_else(|| ReceiverError::InvalidConfig("sample_rate overflow".to_string()))?;

        let block_size = BLOCK_SIZE_SAMPLES;
        let packet_len_samples = packet_symbols * symbol_length;
        let blocks_needed = packet_len_samples.div_ceil(block_size);
        let buffer_len = blocks_needed * block_size + block_size;

        Ok(PacketConfig {
            bit_rate,
            symbol_length,
            preamble_symbols,
            packet_symbols,
            preamble_pattern,
            sample_rate,
            block_size,
            buffer_len,
        })
    }

    /// The protocol's default configuration, per spec.md §6's constants.
    pub fn default_protocol() -> Self {
        Self::new(
            BIT_RATE,
            SYMBOL_LENGTH,
            PREAMBLE_SYMBOLS,
            PACKET_SYMBOLS,
            PREAMBLE,
        )
        .expect("hardcoded protocol constants must build a valid PacketConfig")
    }
}

impl Default for PacketConfig {
    fn default() -> Self {
        Self::default_protocol()
    }
}

/// Serializable top-level receiver configuration: the `PacketConfig` inputs
/// plus the ambient CLI-level settings (station-ID filter, verbosity).
///
/// `Default` reproduces the hardcoded protocol constants exactly so tests and
/// the CLI share one source of truth; [`ReceiverConfig::from_json_file`]
/// loads an override from disk for the CLI's optional `--config` flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiverConfig {
    pub bit_rate: u32,
    pub symbol_length: usize,
    pub preamble_symbols: usize,
    pub packet_symbols: usize,
    pub preamble_bits: String,
    /// Station ID to accept; messages from other stations are discarded by
    /// the caller (the core does not filter: see `Non-goals`, "multi-
    /// transmitter arbitration beyond an ID filter").
    pub station_id: u8,
    pub verbose: bool,
}

impl ReceiverConfig {
    /// Build the `PacketConfig` this configuration describes.
    pub fn packet_config(&self) -> Result<PacketConfig, ReceiverError> {
        PacketConfig::new(
            self.bit_rate,
            self.symbol_length,
            self.preamble_symbols,
            self.packet_symbols,
            &self.preamble_bits,
        )
    }

    /// Load a `ReceiverConfig` from a JSON file, for the CLI's `--config`
    /// flag. The file must specify every field; start from
    /// `serde_json::to_string_pretty(&ReceiverConfig::default())` to get a
    /// template with every field present.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self, ReceiverError> {
        let text = std::fs::read_to_string(path).map_err(ReceiverError::CaptureIo)?;
        serde_json::from_str(&text)
            .map_err(|e| ReceiverError::InvalidConfig(format!("{path:?}: {e}")))
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        ReceiverConfig {
            bit_rate: BIT_RATE,
            symbol_length: SYMBOL_LENGTH,
            preamble_symbols: PREAMBLE_SYMBOLS,
            packet_symbols: PACKET_SYMBOLS,
            preamble_bits: PREAMBLE.to_string(),
            station_id: 0,
            verbose: false,
        }
    }
}
