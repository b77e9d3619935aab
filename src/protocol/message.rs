//! Validated message types.
//!
//! A [`Packet`] is raw, CRC-unchecked bytes plus the sample index where its
//! preamble was found. A [`Message`] is the result of successfully
//! validating a `Packet`: header fields split out, and the payload decoded
//! per its sensor-subtype tag.

/// Raw extracted packet, pre-validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Sample index within the current block where the preamble started.
    pub idx: usize,
    /// Bit-packed payload bytes, MSB-first, pre-bit-reversal.
    pub data: Vec<u8>,
}

/// Sensor-subtype payload, tagged by the high nibble of header byte 0.
///
/// Each variant's value is the decoded physical quantity per the wire
/// format's scale factor; `Unknown` carries the raw code for subtypes this
/// receiver doesn't decode (per the `Non-goals` on exhaustive subtype
/// coverage).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorReading {
    UvIndex(f64),
    SolarRadiation(f64),
    Light(f64),
    Temperature(f64),
    Humidity(f64),
    Rain(f64),
    Unknown { code: u8 },
}

impl SensorReading {
    /// Decode a sensor reading from a header nibble and the `v12` field
    /// derived from payload bytes 3 and 4.
    pub fn decode(code: u8, r0: u8, r1: u8) -> Self {
        let v12 = ((r0 as u16) << 4) | (r1 as u16 >> 4);
        match code {
            0x4 => SensorReading::UvIndex((v12 as f64 - 4.0) / 200.0),
            0x6 => SensorReading::SolarRadiation((v12 as f64 - 4.0) / 2.27),
            0x7 => SensorReading::Light(v12 as f64),
            0x8 => {
                let raw12 = (((r0 as u16) << 8) | r1 as u16) >> 4;
                SensorReading::Temperature(sign_extend_12(raw12) as f64 / 10.0)
            }
            0xA => {
                let raw = (((r1 as u16 >> 4) << 8) | r0 as u16) as f64;
                SensorReading::Humidity(raw / 10.0)
            }
            0xE => SensorReading::Rain(r0 as f64),
            other => SensorReading::Unknown { code: other },
        }
    }
}

/// Sign-extend a 12-bit two's-complement value held in the low 12 bits of
/// a `u16`.
fn sign_extend_12(value: u16) -> i16 {
    let shifted = (value << 4) as i16;
    shifted >> 4
}

/// A validated, decoded message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Low 3 bits of header byte 0.
    pub station_id: u8,
    /// Bit 3 of header byte 0.
    pub low_battery: bool,
    /// Wind speed, byte 1, raw units per wire format.
    pub wind_speed: u8,
    /// Wind direction, byte 2, scaled to degrees.
    pub wind_direction_deg: f64,
    /// Decoded sensor-specific reading from bytes 3 and 4.
    pub sensor: SensorReading,
    /// Estimated carrier frequency error, in Hz, measured from this packet.
    pub freq_error_hz: f64,
}

impl Message {
    /// Build a `Message` from a validated (CRC-checked, bit-reversed)
    /// packet body and a frequency-error measurement.
    pub fn from_payload(data: &[u8], freq_error_hz: f64) -> Self {
        debug_assert!(data.len() >= 5, "payload too short to decode header fields");

        let header = data[0];
        let station_id = header & 0x07;
        let low_battery = header & 0x08 != 0;
        let sensor_code = header >> 4;
        let wind_speed = data[1];
        let wind_direction_deg = data[2] as f64 * 360.0 / 255.0;
        let sensor = SensorReading::decode(sensor_code, data[3], data[4]);

        Message {
            station_id,
            low_battery,
            wind_speed,
            wind_direction_deg,
            sensor,
            freq_error_hz,
        }
    }
}
