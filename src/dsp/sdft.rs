//! Sliding DFT demodulator core.
//!
//! Computes a real-valued FSK discriminator from complex baseband samples
//! without ever evaluating a full 14-point DFT on the hot path. Only bins 10
//! and 11 (the mark/space tones) are tracked, via the recurrence
//!
//! ```text
//! h_k[i] = -(h_k[i-1] + delta) * C_k,  delta = x[i+N-1] - x[i-1]
//! ```
//!
//! which costs one complex add and one complex multiply per sample per bin,
//! versus ~196 complex multiplies for a direct 14-point DFT evaluated at
//! every sample.

use crate::constants::sdft::{C3_IM, C3_RE, C4_IM, C4_RE};
use num_complex::Complex64;

/// Sliding-DFT window length.
pub const N: usize = crate::constants::SDFT_N;

#[inline]
fn c3() -> Complex64 {
    Complex64::new(C3_RE, C3_IM)
}

#[inline]
fn c4() -> Complex64 {
    Complex64::new(C4_RE, C4_IM)
}

/// Persisted sliding-DFT state, carried across block boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sdft {
    delta: Complex64,
    h10: Complex64,
    h11: Complex64,
}

impl Sdft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demodulate `in_` into `out`.
    ///
    /// `in_.len() >= N + 1` and `out.len() >= in_.len() - N` are
    /// preconditions; violating them is a programmer error and panics.
    ///
    /// `out[i] = |h10|^2 - |h11|^2` at sample `i`, where `h10`/`h11` are the
    /// bin-10/bin-11 sliding-DFT values for the window starting at `i`.
    pub fn demod(&mut self, in_: &[Complex64], out: &mut [f64]) {
        assert!(
            in_.len() >= N + 1,
            "sdft input too short: {} samples, need at least {}",
            in_.len(),
            N + 1
        );
        let m = in_.len() - N;
        assert!(
            out.len() >= m,
            "sdft output too short: {} slots, need at least {m}",
            out.len()
        );

        let c3 = c3();
        let c4 = c4();

        let mut h10 = -(self.h10 + self.delta) * c3;
        let mut h11 = -(self.h11 + self.delta) * c4;
        out[0] = mag_sq(h10) - mag_sq(h11);

        for i in 1..m {
            let delta = in_[i + N - 1] - in_[i - 1];
            h10 = -(h10 + delta) * c3;
            h11 = -(h11 + delta) * c4;
            out[i] = mag_sq(h10) - mag_sq(h11);
        }

        self.delta = in_[in_.len() - 1] - in_[in_.len() - N - 1];
        self.h10 = h10;
        self.h11 = h11;
    }
}

#[inline]
fn mag_sq(z: Complex64) -> f64 {
    z.re * z.re + z.im * z.im
}

/// Direct (reference) 14-point DFT, used only in tests to validate the
/// sliding recurrence against a non-incremental computation.
#[cfg(test)]
pub fn dft14(window: &[Complex64]) -> Vec<Complex64> {
    use std::f64::consts::PI;
    let n = N;
    assert_eq!(window.len(), n);
    let mut out = vec![Complex64::new(0.0, 0.0); n];
    for (k, slot) in out.iter_mut().enumerate() {
        let mut acc = Complex64::new(0.0, 0.0);
        for (idx, sample) in window.iter().enumerate() {
            let theta = -2.0 * PI * (k as f64) * (idx as f64) / (n as f64);
            acc += *sample * Complex64::new(theta.cos(), theta.sin());
        }
        *slot = acc;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn direct_bin_power_diff(window: &[Complex64]) -> f64 {
        let bins = dft14(window);
        mag_sq(bins[10]) - mag_sq(bins[11])
    }

    #[test]
    fn matches_direct_dft_on_random_input() {
        // in_.len() = N + 5 => 5 outputs, each checked against a direct DFT
        // of the corresponding N-sample window.
        let m = 5;
        let mut rng_state: u64 = 0x2545F4914F6CDD1D;
        let mut next = || {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;
            ((rng_state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        };
        let samples: Vec<Complex64> = (0..N + m)
            .map(|_| Complex64::new(next(), next()))
            .collect();

        let mut sdft = Sdft::new();
        let mut out = vec![0.0; m];
        sdft.demod(&samples, &mut out);

        for i in 0..m {
            let expected = direct_bin_power_diff(&samples[i..i + N]);
            let rel_err = ((out[i] - expected) / expected.max(1e-300)).abs();
            assert!(
                rel_err < 1e-9 || (out[i] - expected).abs() < 1e-9,
                "index {i}: got {}, expected {expected}",
                out[i]
            );
        }
    }

    #[test]
    fn streaming_equivalence_over_two_calls() {
        // Splitting an M+N sample input into two halves and carrying state
        // across the split must equal one call on the whole input.
        let total = N + 20;
        let mut rng_state: u64 = 0xD1B54A32D192ED03;
        let mut next = || {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;
            ((rng_state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        };
        let samples: Vec<Complex64> = (0..total).map(|_| Complex64::new(next(), next())).collect();

        let mut whole_sdft = Sdft::new();
        let mut whole_out = vec![0.0; total - N];
        whole_sdft.demod(&samples, &mut whole_out);

        // Split at N + 10: first call consumes samples[0..N+10], producing
        // 10 outputs and carrying state; second call consumes the tail with
        // an N-sample historical overlap, as Demodulate's block scroll does.
        let split = N + 10;
        let mut streamed_sdft = Sdft::new();
        let mut first_out = vec![0.0; split - N];
        streamed_sdft.demod(&samples[0..split], &mut first_out);

        let mut second_out = vec![0.0; total - split];
        streamed_sdft.demod(&samples[split - N..], &mut second_out);

        let mut combined = first_out;
        combined.extend(second_out);

        assert_eq!(combined.len(), whole_out.len());
        for (a, b) in combined.iter().zip(whole_out.iter()) {
            assert_eq!(a.to_bits(), b.to_bits(), "streamed and single-call outputs must be bitwise identical");
        }
    }

    proptest! {
        #[test]
        fn streaming_equivalence_property(
            seed in any::<u64>(),
            extra in 5usize..60,
            split_offset in 1usize..30,
        ) {
            let total = N + extra;
            let split_offset = split_offset.min(extra.saturating_sub(1)).max(1);
            let split = N + split_offset;
            if split >= total { return Ok(()); }

            let mut state = seed | 1;
            let mut next = move || {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
            };
            let samples: Vec<Complex64> = (0..total).map(|_| Complex64::new(next(), next())).collect();

            let mut whole_sdft = Sdft::new();
            let mut whole_out = vec![0.0; total - N];
            whole_sdft.demod(&samples, &mut whole_out);

            let mut streamed_sdft = Sdft::new();
            let mut first_out = vec![0.0; split - N];
            streamed_sdft.demod(&samples[0..split], &mut first_out);
            let mut second_out = vec![0.0; total - split];
            streamed_sdft.demod(&samples[split - N..], &mut second_out);

            let mut combined = first_out;
            combined.extend(second_out);

            prop_assert_eq!(combined.len(), whole_out.len());
            for (a, b) in combined.iter().zip(whole_out.iter()) {
                prop_assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }
}
