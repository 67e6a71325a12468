//! This module defines the bus events consumed by the decoder, and the small
//! value types shared by the rest of the crate.

use core::fmt;

use snafu::Snafu;

/// Error type for the fallible edges of the crate.
///
/// The decoder itself never fails, these errors only come from turning text
/// into typed input.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// The name doesn't match any supported device profile.
    #[snafu(display("Unknown device profile"))]
    UnknownProfile,
    /// A bus trace line couldn't be parsed.
    #[snafu(display("Malformed trace line at column {}", column))]
    MalformedTrace {
        /// Zero-based character offset where parsing stopped.
        column: usize,
    },
}

/// Event timestamp, in nanoseconds since the start of the capture.
pub type Timestamp = u64;

/// Transfer direction of a bus transaction.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
pub enum Direction {
    /// Host to device (I2C write).
    Request,
    /// Device to host (I2C read).
    Response,
}

impl Direction {
    /// Direction of a transaction with the given I2C read bit.
    pub const fn from_read(read: bool) -> Self {
        if read {
            Self::Response
        } else {
            Self::Request
        }
    }

    /// `true` for device to host transfers.
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Response)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Request => "request",
            Self::Response => "response",
        })
    }
}

/// One event from the bus-event source.
///
/// Events must be delivered in time order. An address always follows a
/// start, and a stop terminates the data bytes of a transaction.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum BusEvent<'a> {
    /// Start (or repeated start) condition.
    Start { time: Timestamp },
    /// Target address selection.
    Address {
        time: Timestamp,
        address: u8,
        read: bool,
    },
    /// One data byte.
    Data { time: Timestamp, byte: u8 },
    /// Stop condition.
    Stop { time: Timestamp },
    /// The event source failed to decode something. Reported, otherwise ignored.
    Error { time: Timestamp, message: &'a str },
}

impl BusEvent<'_> {
    /// Timestamp of the event.
    pub const fn time(&self) -> Timestamp {
        match *self {
            BusEvent::Start { time }
            | BusEvent::Address { time, .. }
            | BusEvent::Data { time, .. }
            | BusEvent::Stop { time }
            | BusEvent::Error { time, .. } => time,
        }
    }
}
