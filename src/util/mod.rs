//! # Utility Modules
//!
//! Common helpers shared across the DSP and protocol layers.

pub mod bitrev;

pub use bitrev::{rev8, rev8_slice};
