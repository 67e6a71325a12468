//! Interpretation of frame payloads into typed values.

use core::fmt;

use arrayvec::ArrayVec;

use crate::profile::Command;
use crate::types::Direction;

/// Largest payload a frame can carry, bounded by the one byte length field.
pub const MAX_PAYLOAD: usize = 255;

/// Raw payload bytes of a frame.
pub type PayloadBytes = ArrayVec<u8, MAX_PAYLOAD>;

// ADC reference, ADC resolution (1/4096) and divider ratio.
const VREF: f64 = 3.3;
const ADC_LSB: f64 = 0.000_244_140_625;
const DIVIDER: f64 = 7.6;

/// Convert a raw 12 bit ADC reading to volts.
pub fn adc_to_volts(raw: u16) -> f64 {
    f64::from(raw) * VREF * ADC_LSB * DIVIDER
}

/// Decoded payload of a frame.
///
/// `Display` renders the value the way it is shown to users: a decimal
/// version, `ON`/`OFF`, volts with three decimals, or lowercase hex.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Payload<'a> {
    /// No payload bytes.
    Empty,
    /// Payload without a typed interpretation.
    Raw(&'a [u8]),
    /// Firmware version reported by the device.
    Version(u8),
    /// Power switch state, `true` is on.
    Switch(bool),
    /// Voltage in volts.
    Voltage(f64),
}

impl<'a> Payload<'a> {
    /// Interpret `bytes` for a frame of `command` completed in `direction`.
    ///
    /// Payloads too short for their typed interpretation are returned raw.
    pub fn interpret(command: Command, direction: Direction, bytes: &'a [u8]) -> Self {
        let typed = match (command, direction) {
            (Command::GetFwVersion, Direction::Response) => {
                bytes.first().map(|&v| Self::Version(v))
            }
            (Command::PowerSwitch, Direction::Request) => {
                bytes.first().map(|&v| Self::Switch(v != 0))
            }
            (Command::GetVoltage, Direction::Response) => be_u16(bytes, 1).map(Self::voltage),
            // unverified scaling, same chain as the voltage readout
            (Command::SetVoltage, _) => be_u16(bytes, 0).map(Self::voltage),
            _ => None,
        };
        typed.unwrap_or_else(|| Self::raw(bytes))
    }

    fn voltage(raw: u16) -> Self {
        Self::Voltage(adc_to_volts(raw))
    }

    fn raw(bytes: &'a [u8]) -> Self {
        if bytes.is_empty() {
            Self::Empty
        } else {
            Self::Raw(bytes)
        }
    }
}

fn be_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    match bytes.get(offset..offset + 2)? {
        &[hi, lo] => Some(u16::from_be_bytes([hi, lo])),
        _ => None,
    }
}

impl fmt::Display for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("None"),
            Self::Raw(bytes) => bytes.iter().try_for_each(|b| write!(f, "{:02x}", b)),
            Self::Version(v) => write!(f, "{}", v),
            Self::Switch(true) => f.write_str("ON"),
            Self::Switch(false) => f.write_str("OFF"),
            Self::Voltage(v) => write!(f, "{:.3}V", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Direction::*;

    #[test]
    fn test_voltage_formula() {
        let expected = format!("{:.3}V", 1000.0 * 3.3 * 0.000244140625 * 7.6);
        assert_eq!(expected, "6.123V");

        // 1000 == 0x03e8, first byte isn't part of the reading
        let reading = [0xff, 0x03, 0xe8, 0x00, 0x00];
        let p = Payload::interpret(Command::GetVoltage, Response, &reading);
        assert_eq!(p, Payload::Voltage(adc_to_volts(1000)));
        assert_eq!(p.to_string(), expected);

        let p = Payload::interpret(Command::SetVoltage, Request, &[0x03, 0xe8]);
        assert_eq!(p.to_string(), "6.123V");
    }

    #[test]
    fn test_power_switch() {
        let on_off = |b: u8| Payload::interpret(Command::PowerSwitch, Request, &[b]).to_string();
        assert_eq!(on_off(0x00), "OFF");
        assert_eq!(on_off(0x01), "ON");
        assert_eq!(on_off(0xff), "ON");
        // response carries no switch state
        let p = Payload::interpret(Command::PowerSwitch, Response, &[0x01]);
        assert_eq!(p.to_string(), "01");
    }

    #[test]
    fn test_fw_version() {
        let p = Payload::interpret(Command::GetFwVersion, Response, &[0x8a]);
        assert_eq!(p, Payload::Version(138));
        assert_eq!(p.to_string(), "138");
        let p = Payload::interpret(Command::GetFwVersion, Request, &[]);
        assert_eq!(p, Payload::Empty);
    }

    #[test]
    fn test_raw_and_empty() {
        let p = Payload::interpret(Command::HeartBeat, Response, &[0x0a, 0xBC, 0x00]);
        assert_eq!(p.to_string(), "0abc00");
        assert_eq!(Payload::interpret(Command::Unknown, Request, &[]).to_string(), "None");
    }

    #[test]
    fn test_short_payload_falls_back() {
        let p = Payload::interpret(Command::GetVoltage, Response, &[0x01, 0x02]);
        assert_eq!(p.to_string(), "0102");
        let p = Payload::interpret(Command::PowerSwitch, Request, &[]);
        assert_eq!(p, Payload::Empty);
        let p = Payload::interpret(Command::SetVoltage, Request, &[0x42]);
        assert_eq!(p.to_string(), "42");
    }
}
