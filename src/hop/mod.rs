//! Channel-hop scheduling.
//!
//! The transmitter hops across 51 channels on a fixed pseudo-random
//! pattern, invisible to the receiver beyond its timing. [`scheduler`]
//! tracks where in that pattern the receiver believes the transmitter is,
//! remembers each channel's last measured frequency error, and runs the
//! dwell-timer state machine that decides when to retune and to where.

pub mod scheduler;

pub use scheduler::{Hop, HopScheduler, HopState, RandomHop, ThreadRngHop};
