//! Packet validation and frequency-error estimation.
//!
//! Turns a raw extracted [`Packet`] into a validated [`Message`]: bit-reverse
//! every byte (the wire sends each byte LSB-first), check the trailing
//! CRC-16, and estimate the transmitter's carrier frequency error from the
//! packet's trailing zero-symbol tail.

use crate::constants::HEADER_LEN;
use crate::dsp::discriminator::discriminate;
use crate::protocol::crc::crc16_check;
use crate::protocol::message::{Message, Packet};
use crate::util::bitrev::rev8_slice;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Nominal IF offset, in Hz, that the frequency-error formula is centred
/// on. Subtracted (as a constant bias) from the measured mean phase slope.
const NOMINAL_OFFSET_HZ: f64 = 9600.0;

/// Validate a packet's CRC and, if it passes, build a [`Message`].
///
/// `zero_tail_samples` must cover samples `qIdx + 8*L ..= qIdx + 24*L` of the
/// complex baseband stream the packet was extracted from (symbols 8 through
/// 24 of the packet body, which carry the trailing zero-symbol run used for
/// frequency-error estimation).
///
/// Returns `None` on CRC failure; this is the only soft-failure outcome at
/// this layer (unknown preambles and duplicates are filtered upstream).
pub fn validate(
    packet: &Packet,
    zero_tail_samples: &[Complex64],
    sample_rate_hz: u32,
) -> Option<Message> {
    let mut data = packet.data.clone();
    rev8_slice(&mut data);

    if !crc16_check(&data[HEADER_LEN..]) {
        return None;
    }

    let freq_error = estimate_freq_error(zero_tail_samples, sample_rate_hz);
    Some(Message::from_payload(&data, freq_error))
}

/// Estimate the carrier frequency error from the packet's trailing
/// zero-symbol run: `-round(9600 + mean(phase_discriminator) * sample_rate / 2pi)`.
fn estimate_freq_error(samples: &[Complex64], sample_rate_hz: u32) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let mut phase_diffs = vec![0.0f64; samples.len() - 1];
    discriminate(samples, &mut phase_diffs);
    let mean: f64 = phase_diffs.iter().sum::<f64>() / phase_diffs.len() as f64;

    -(NOMINAL_OFFSET_HZ + mean * sample_rate_hz as f64 / (2.0 * PI)).round()
}
