//! Byte-to-complex lookup table.
//!
//! The tuner hands us interleaved unsigned-byte I/Q pairs. A 256-entry
//! table maps each byte to the `f64` it represents so the hot path never
//! recomputes the affine scale.

use num_complex::Complex64;

/// Precomputed `(b - 127.4) / 127.6` for every possible byte value.
#[derive(Debug, Clone)]
pub struct ByteToComplexLut([f64; 256]);

impl ByteToComplexLut {
    pub fn new() -> Self {
        let mut table = [0.0f64; 256];
        for (idx, slot) in table.iter_mut().enumerate() {
            *slot = (idx as f64 - 127.4) / 127.6;
        }
        ByteToComplexLut(table)
    }

    /// Decode interleaved I/Q bytes into complex samples.
    ///
    /// `input.len()` must equal `2 * output.len()`.
    pub fn execute(&self, input: &[u8], output: &mut [Complex64]) {
        assert_eq!(
            input.len(),
            output.len() << 1,
            "incompatible slice lengths: {} raw bytes for {} complex samples",
            input.len(),
            output.len()
        );

        for (idx, out) in output.iter_mut().enumerate() {
            let in_idx = idx << 1;
            *out = Complex64::new(
                self.0[input[in_idx] as usize],
                self.0[input[in_idx + 1] as usize],
            );
        }
    }
}

impl Default for ByteToComplexLut {
    fn default() -> Self {
        Self::new()
    }
}
