//! Arena-owning demodulator: scrolls the working buffers, runs the SDFT and
//! phase-discriminator passes, quantises, slices, searches for preambles
//! and extracts/deduplicates packets.
//!
//! # Buffer layout and the front-window search
//!
//! `Quantized` (and the parallel `IqHistory` kept for frequency-error
//! lookups) hold `PacketConfig::buffer_len` samples of history, oldest at
//! index 0, newest at the tail. Each call discards the oldest `block_size`
//! samples and appends `block_size` new ones at the tail — see
//! [`Demodulator::demodulate`].
//!
//! A packet is `packet_symbols * symbol_length` samples long — for the
//! protocol defaults, about 2.2 blocks — so a preamble match can only be
//! safely extracted once the buffer already holds that much data *beyond*
//! it. Searching the newest (tail) samples for a fresh preamble would find
//! one before its body has arrived. Instead, following the reference
//! receiver this was distilled from (`original_source/dsp/dsp.go`'s
//! `Pack`/`Search`/`Slice`), every call re-slices and searches only a fixed
//! front window of length `block_size + preamble_len_samples`: as data ages
//! leftward through the buffer it passes through this window exactly once
//! at a position `<= block_size`, by which point the buffer's remaining
//! length past it already exceeds the longest packet. The `qIdx > block_size`
//! skip in [`Demodulator::extract_packets`] is what selects that single
//! pass; see `DESIGN.md` for the full argument.

use std::collections::HashSet;

use num_complex::Complex64;

use crate::config::PacketConfig;
use crate::dsp::lut::ByteToComplexLut;
use crate::dsp::quantize::quantize_slice;
use crate::dsp::sdft::{self, Sdft};
use crate::dsp::slicer::PreambleFinder;
use crate::protocol::message::Packet;

/// Owns every working arena for one demodulation pipeline instance. Built
/// once from a [`PacketConfig`] and reused block after block; no arena is
/// reallocated on the hot path.
pub struct Demodulator {
    config: PacketConfig,

    lut: ByteToComplexLut,
    sdft: Sdft,
    finder: PreambleFinder,

    /// Raw interleaved I/Q bytes, length `2 * buffer_len`.
    raw: Vec<u8>,
    /// Complex samples for the SDFT hot path: `block_size + N`, the first
    /// `N` carried over from the previous block.
    iq: Vec<Complex64>,
    /// Discriminator output, length `2 * block_size`: front half is the
    /// previous block's tail, back half is freshly computed.
    demodulated: Vec<f64>,
    /// Quantised bits, length `buffer_len`, oldest at index 0.
    quantized: Vec<u8>,
    /// Complex-sample history parallel to `quantized`, kept only so the
    /// frequency-error estimator can read the samples around a packet
    /// found deep in the aged front window — `iq` itself is too short for
    /// this by design (see module docs).
    iq_history: Vec<Complex64>,

    /// Length, in symbols, of each of the `symbol_length` phase slices.
    symbols_per_block: usize,
    /// Flat `symbol_length * symbols_per_block` buffer partitioned into
    /// `symbol_length` equal-length phase views.
    slices_flat: Vec<u8>,

    /// Packed packet-body scratch buffer, length `ceil(packet_symbols / 8)`.
    pkt: Vec<u8>,
    /// Per-call dedup set (hex-encoded packet bodies).
    seen: HashSet<String>,
}

impl Demodulator {
    pub fn new(config: PacketConfig) -> Self {
        let block_size = config.block_size;
        let buffer_len = config.buffer_len;
        let symbol_length = config.symbol_length;
        let preamble_len_samples = config.preamble_symbols * symbol_length;

        let symbols_per_block = (block_size + preamble_len_samples) / symbol_length;
        let finder = PreambleFinder::new(&config.preamble_pattern);

        Demodulator {
            lut: ByteToComplexLut::new(),
            sdft: Sdft::new(),
            finder,

            raw: vec![0u8; buffer_len * 2],
            iq: vec![Complex64::new(0.0, 0.0); block_size + sdft::N],
            demodulated: vec![0.0; block_size * 2],
            quantized: vec![0u8; buffer_len],
            iq_history: vec![Complex64::new(0.0, 0.0); buffer_len],

            symbols_per_block,
            slices_flat: vec![0u8; symbol_length * symbols_per_block],

            pkt: vec![0u8; config.packet_symbols.div_ceil(8)],
            seen: HashSet::new(),

            config,
        }
    }

    pub fn config(&self) -> &PacketConfig {
        &self.config
    }

    /// Process one block of `2 * block_size` raw interleaved I/Q bytes,
    /// returning the (pre-validation, deduplicated) packets extracted from
    /// it. Allocates nothing beyond the returned `Vec`'s growth.
    pub fn demodulate(&mut self, raw_block: &[u8]) -> Vec<Packet> {
        let block_size = self.config.block_size;
        let buffer_len = self.config.buffer_len;
        assert_eq!(
            raw_block.len(),
            block_size * 2,
            "raw block must be exactly 2*block_size bytes"
        );

        // 1. Scroll buffers down by block_size (2*block_size for Raw),
        //    preserving the tail each windowed op needs.
        self.raw.copy_within(block_size * 2.., 0);
        self.iq.copy_within(block_size.., 0);
        self.demodulated.copy_within(block_size.., 0);
        self.quantized.copy_within(block_size.., 0);
        self.iq_history.copy_within(block_size.., 0);

        // 2. Append the new block.
        let raw_tail_start = buffer_len * 2 - block_size * 2;
        self.raw[raw_tail_start..].copy_from_slice(raw_block);
        let iq_tail = self.iq.len() - block_size;
        self.lut.execute(&self.raw[raw_tail_start..], &mut self.iq[iq_tail..]);
        let history_tail = buffer_len - block_size;
        self.iq_history[history_tail..].copy_from_slice(&self.iq[iq_tail..]);

        // 3. SDFT demodulation of the whole IQ buffer into the back half of
        //    Demodulated.
        let demod_tail = self.demodulated.len() - block_size;
        self.sdft.demod(&self.iq, &mut self.demodulated[demod_tail..]);

        // 4. Quantise the back half of Demodulated into the tail of
        //    Quantized.
        let quant_tail = self.quantized.len() - block_size;
        quantize_slice(&self.demodulated[demod_tail..], &mut self.quantized[quant_tail..]);

        // 5. Re-slice phase streams from the front search window.
        self.repopulate_slices();

        // 6. Search preambles, extract packets, dedup.
        let indices = self.search_preambles();
        self.extract_packets(&indices)
    }

    /// Read-only access to the complex-sample history parallel to
    /// `Quantized`, for the frequency-error estimator.
    pub fn iq_history(&self) -> &[Complex64] {
        &self.iq_history
    }

    fn repopulate_slices(&mut self) {
        let symbol_length = self.config.symbol_length;
        for phase in 0..symbol_length {
            let lower = phase * self.symbols_per_block;
            let upper = lower + self.symbols_per_block;
            let slice = &mut self.slices_flat[lower..upper];
            for (k, bit) in slice.iter_mut().enumerate() {
                *bit = self.quantized[phase + k * symbol_length];
            }
        }
    }

    /// Search every phase slice for the preamble, returning absolute sample
    /// indices (within the front search window) in the order the slices
    /// were scanned.
    fn search_preambles(&self) -> Vec<usize> {
        let symbol_length = self.config.symbol_length;
        let mut indices = Vec::new();
        for phase in 0..symbol_length {
            let lower = phase * self.symbols_per_block;
            let upper = lower + self.symbols_per_block;
            let slice = &self.slices_flat[lower..upper];
            for offset in self.finder.find_all(slice) {
                indices.push(offset * symbol_length + phase);
            }
        }
        indices
    }

    fn extract_packets(&mut self, indices: &[usize]) -> Vec<Packet> {
        self.seen.clear();
        let mut packets = Vec::new();
        let symbol_length = self.config.symbol_length;
        let packet_symbols = self.config.packet_symbols;
        let block_size = self.config.block_size;

        for &q_idx in indices {
            if q_idx > block_size {
                // Body hasn't fully arrived in this window; it will be
                // re-detected (accepted) once it ages further.
                continue;
            }

            for p in 0..packet_symbols {
                let bit = self.quantized[q_idx + p * symbol_length];
                let byte_idx = p >> 3;
                self.pkt[byte_idx] = (self.pkt[byte_idx] << 1) | bit;
            }

            let key = hex::encode(&self.pkt);
            if self.seen.insert(key) {
                packets.push(Packet {
                    idx: q_idx,
                    data: self.pkt.clone(),
                });
            }
        }

        packets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{crc as crc_const, HEADER_LEN, PACKET_SYMBOLS, PREAMBLE, SYMBOL_LENGTH};
    use crate::protocol::crc::crc16;
    use crate::util::bitrev::rev8;

    /// Build a `PacketConfig` whose packet spans the preamble plus one full
    /// real header-through-CRC frame (`PACKET_SYMBOLS`), so tests exercise
    /// genuine extraction/packing without needing to synthesize a full-size
    /// waveform from scratch.
    fn small_config() -> PacketConfig {
        PacketConfig::new(
            19_200,
            SYMBOL_LENGTH,
            PREAMBLE.len(),
            PREAMBLE.len() + PACKET_SYMBOLS,
            PREAMBLE,
        )
        .expect("valid test config")
    }

    /// `payload` is the full pre-CRC frame: `[header, wind_speed, wind_dir,
    /// sensor0, sensor1, pad, pad, pad]`. The CRC covers only
    /// `payload[HEADER_LEN..]`, matching `protocol::validator`'s fixture.
    fn build_packet_bits(payload: [u8; 8]) -> Vec<u8> {
        let crc = crc16(&payload[HEADER_LEN..]);
        let mut framed = payload.to_vec();
        framed.push((crc >> 8) as u8);
        framed.push((crc & 0xFF) as u8);
        // On the wire each byte is sent LSB-first, so bit-reverse before
        // turning into a bitstream, matching `validate`'s expectation that
        // raw extracted bits need `rev8` applied to become MSB-first.
        let reversed: Vec<u8> = framed.iter().map(|&b| rev8(b)).collect();

        let mut bits = Vec::with_capacity(reversed.len() * 8);
        for byte in reversed {
            for i in (0..8).rev() {
                bits.push((byte >> i) & 1);
            }
        }
        bits
    }

    /// Drive `demodulate` on all-zero blocks (a quiescent radio with no
    /// carrier present) and confirm it neither panics nor reports a
    /// (spurious) preamble match, across enough calls for a sample all the
    /// way from the first block to have aged through to the front search
    /// window.
    #[test]
    fn silence_produces_no_packets_across_full_buffer_cycle() {
        let config = small_config();
        let mut demod = Demodulator::new(config.clone());
        let block_bytes = config.block_size * 2;
        let zero_block = vec![127u8; block_bytes]; // near-zero complex sample

        let rounds = config.buffer_len / config.block_size + 2;
        for _ in 0..rounds {
            let packets = demod.demodulate(&zero_block);
            assert!(packets.is_empty());
        }
    }

    /// Place a preamble directly at the front of the (oldest) quantized
    /// history and confirm the extractor finds and packs it at `idx == 0`
    /// without depending on the SDFT/tone-encoding chain — this isolates
    /// the slicing, searching and bit-packing logic from signal synthesis,
    /// which this test suite can't verify by actually running the decoder.
    #[test]
    fn preamble_at_front_of_window_extracts_at_idx_zero() {
        let config = small_config();
        let mut demod = Demodulator::new(config.clone());

        let preamble_bits: Vec<u8> = PREAMBLE.bytes().map(|b| (b == b'1') as u8).collect();
        // Non-degenerate payload (same fixture as `protocol::validator`'s
        // tests): CRC-16/CCITT of an all-zero span is trivially 0 regardless
        // of windowing, so a zero payload here couldn't catch a bit-packing
        // or CRC-window bug.
        let body = build_packet_bits([0x84, 0x10, 0x80, 0x03, 0xC0, 0, 0, 0]);
        assert_eq!(body.len(), config.packet_symbols - config.preamble_symbols);

        let mut bits = preamble_bits;
        bits.extend(body);
        assert_eq!(bits.len(), config.packet_symbols);

        for (k, &bit) in bits.iter().enumerate() {
            let sample_idx = k * config.symbol_length;
            demod.quantized[sample_idx] = bit;
        }

        demod.repopulate_slices();
        let indices = demod.search_preambles();
        assert!(indices.contains(&0), "expected a match at index 0, got {indices:?}");

        let packets = demod.extract_packets(&indices);
        let packet = packets
            .iter()
            .find(|p| p.idx == 0)
            .expect("expected a packet extracted at idx 0");
        assert_eq!(packet.data.len(), config.packet_symbols.div_ceil(8));

        // The extracted bytes, bit-reversed (over-the-air LSB-first), must
        // carry a CRC that checks out, since `body` was built from a
        // valid-CRC payload. `data[0..2]` is the preamble itself (16 bits
        // packed to exactly 2 bytes); the real header-through-CRC frame
        // starts at `data[2..]`, and its own CRC-covered region excludes
        // that frame's `HEADER_LEN`-byte header, i.e. overall offset
        // `2 + HEADER_LEN`.
        let mut data = packet.data.clone();
        crate::util::bitrev::rev8_slice(&mut data);
        assert!(crate::protocol::crc::crc16_check(&data[2 + HEADER_LEN..]));
    }

    #[test]
    fn candidate_past_block_size_is_skipped_this_call() {
        let config = small_config();
        let mut demod = Demodulator::new(config.clone());
        // Directly exercise extract_packets' boundary rule without needing
        // a fully synthesized waveform: a candidate index one past
        // block_size must never appear in the output.
        let indices = vec![config.block_size + 1];
        let packets = demod.extract_packets(&indices);
        assert!(packets.is_empty());
    }

    #[test]
    fn duplicate_candidates_in_one_call_deduplicate() {
        let config = small_config();
        let mut demod = Demodulator::new(config.clone());
        // Two different starting offsets that happen to read the same
        // quantized bits (an all-zero buffer) must collapse to one packet.
        let indices = vec![0usize, 1usize];
        let packets = demod.extract_packets(&indices);
        assert_eq!(packets.len(), 1);
    }

    #[test]
    fn crc_parameters_are_the_protocol_defaults() {
        assert_eq!(crc_const::POLY, 0x1021);
        assert_eq!(crc_const::INIT, 0x0000);
        assert_eq!(crc_const::XOROUT, 0x0000);
    }
}
