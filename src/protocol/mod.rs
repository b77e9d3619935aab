//! Packet framing: CRC-16/CCITT, payload decoding, and the validator that
//! turns a raw bit-reversed packet candidate into a [`message::Message`].

pub mod crc;
pub mod message;
pub mod validator;

pub use crc::{crc16, crc16_check};
pub use message::{Message, Packet, SensorReading};
pub use validator::validate;
