//! Hard-decision quantizer.
//!
//! Converts an SDFT discriminator sample into a single bit by inspecting the
//! IEEE-754 sign bit directly, rather than comparing against zero: `-0.0`
//! must quantize to `1` (negative), matching the sign-bit convention used
//! throughout the symbol slicer.

/// Quantize `x` to a single bit via its sign bit.
///
/// `Quantize(-0.0) == 1`, `Quantize(+0.0) == 0`, matching IEEE-754's
/// distinct signed-zero bit patterns.
#[inline]
pub fn quantize(x: f64) -> u8 {
    (x.to_bits() >> 63) as u8
}

/// Quantize a slice of discriminator samples into packed bits, one bit per
/// output byte (MSB unused, value in `{0, 1}`).
pub fn quantize_slice(in_: &[f64], out: &mut [u8]) {
    assert_eq!(in_.len(), out.len());
    for (x, bit) in in_.iter().zip(out.iter_mut()) {
        *bit = quantize(*x);
    }
}
