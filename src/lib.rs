//! Sans-io decoder for the I2C command protocol spoken by Bitmain APW power
//! supplies and dsPIC hash board controllers.
//!
//! The decoder consumes bus events (start, address, data, stop) from an I2C
//! analyzer and turns them into [`DecodedFrame`]s with a typed command,
//! payload and checksum verdict. It never touches the bus itself.
//!
//! ```
//! use bm_i2c_proto::{parse_trace, Decoder, DeviceProfile};
//!
//! let trace = "
//! 0 start
//! 1 address 0x10 w
//! 2 data 0x55
//! 3 stop
//! ";
//! let mut decoder = Decoder::new(DeviceProfile::PowerSupply);
//! for event in parse_trace(trace) {
//!     if let Some(frame) = decoder.handle(&event?) {
//!         println!("{}", frame);
//!     }
//! }
//! assert_eq!(decoder.position(), 1);
//! # Ok::<(), bm_i2c_proto::Error>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod decoder;
pub mod frame;
mod nom_parser;
pub mod payload;
pub mod profile;
pub mod types;

pub use decoder::{Decoder, Diagnostics, Frames};
pub use frame::{ChecksumVerdict, DecodedFrame};
pub use nom_parser::{parse_trace, parse_trace_line};
pub use payload::Payload;
pub use profile::{Command, DeviceProfile};
pub use types::{BusEvent, Direction, Error, Timestamp};
