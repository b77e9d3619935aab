//! Signal-processing pipeline: byte-to-complex lookup, the sliding DFT
//! discriminator, quantization, symbol-phase slicing, preamble search and
//! the top-level [`demodulator::Demodulator`] that ties them together.

pub mod demodulator;
pub mod discriminator;
pub mod lut;
pub mod quantize;
pub mod sdft;
pub mod slicer;

pub use demodulator::Demodulator;
pub use lut::ByteToComplexLut;
pub use quantize::{quantize, quantize_slice};
pub use sdft::Sdft;
pub use slicer::{slice_all_phases, slice_phase, PreambleFinder};
