//! Phase discriminator.
//!
//! A second, independent pass over the same complex samples the SDFT
//! consumes, used only to estimate the carrier frequency error of a
//! received packet (spec's hop scheduler uses this to decide whether the
//! current channel's actual center frequency has drifted from the table
//! value). It is not part of the bit-recovery path.
//!
//! For each sample pair `x[i-1], x[i]`, the instantaneous phase change is
//! `arg(x[i] * conj(x[i-1]))`, the standard FM discriminator. Averaging this
//! over a packet's samples and scaling by the sample rate gives a frequency
//! estimate in Hz.

use num_complex::Complex64;

/// Instantaneous phase-difference discriminator output for consecutive
/// sample pairs. `out.len() == in_.len() - 1`.
pub fn discriminate(in_: &[Complex64], out: &mut [f64]) {
    assert!(in_.len() >= 2, "discriminator needs at least 2 samples");
    assert_eq!(out.len(), in_.len() - 1);

    for i in 0..out.len() {
        let prod = in_[i + 1] * in_[i].conj();
        out[i] = prod.im.atan2(prod.re);
    }
}

/// Estimate the carrier frequency error, in Hz, of a block of samples
/// captured while locked to `expected_freq_hz`.
///
/// Averages the discriminator's instantaneous phase-difference output and
/// converts from radians/sample to Hz via the sample rate.
pub fn frequency_error_hz(in_: &[Complex64], sample_rate_hz: u32) -> f64 {
    if in_.len() < 2 {
        return 0.0;
    }
    let mut phase_diffs = vec![0.0f64; in_.len() - 1];
    discriminate(in_, &mut phase_diffs);

    let mean_phase_diff: f64 = phase_diffs.iter().sum::<f64>() / phase_diffs.len() as f64;
    mean_phase_diff * sample_rate_hz as f64 / (2.0 * std::f64::consts::PI)
}
