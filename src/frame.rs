//! Frame assembly: the byte position state machine, the running checksum
//! and the finished [`DecodedFrame`].
//!
//! A frame on the wire looks like this, where the preamble is left out of
//! dsPIC responses:
//!
//! ```text
//! +------+------+-----+------+-----------------+--------+--------+
//! | 0x55 | 0xAA | len | code | payload ...     | chk    | chk    |
//! +------+------+-----+------+-----------------+--------+--------+
//!                |<------- len bytes, checksum included -------->|
//! ```
//!
//! Frames without payload may use the short form `code 0x01`, which ends on
//! the marker and carries no checksum.

use core::fmt;

use log::{trace, warn};

use crate::decoder::Transaction;
use crate::payload::{Payload, PayloadBytes};
use crate::profile::{ChecksumOrder, Command, DeviceProfile, PREAMBLE_0, PREAMBLE_1};
use crate::types::{Direction, Timestamp};

/// Code position value marking the short frame form.
const SHORT_FRAME_MARKER: u8 = 1;
/// Declared length of a short frame.
const SHORT_FRAME_LEN: u8 = 2;
/// Body position of the last byte of a short frame, the marker itself.
const SHORT_FRAME_LAST: usize = 1;

/// Outcome of comparing the transmitted checksum with the computed one.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
pub enum ChecksumVerdict {
    /// The frame carried a zero checksum, meaning none.
    Absent,
    Valid,
    Invalid,
}

impl ChecksumVerdict {
    /// Judge a `declared` checksum against the `computed` sum.
    pub const fn check(declared: u16, computed: u16) -> Self {
        if declared == 0 {
            Self::Absent
        } else if declared == computed {
            Self::Valid
        } else {
            Self::Invalid
        }
    }
}

impl fmt::Display for ChecksumVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Absent => "None",
            Self::Valid => "OK",
            Self::Invalid => "KO",
        })
    }
}

/// Running 16 bit checksum of a frame.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Checksum {
    declared: u16,
    computed: u16,
}

impl Checksum {
    /// Add a body byte to the computed sum, wrapping at 16 bits.
    pub(crate) fn add(&mut self, byte: u8) {
        self.computed = self.computed.wrapping_add(byte.into());
    }

    /// Store the first transmitted checksum byte.
    pub(crate) fn set_first(&mut self, byte: u8, order: ChecksumOrder) {
        self.declared = match order {
            ChecksumOrder::BigEndian => u16::from(byte) << 8,
            ChecksumOrder::LittleEndian => byte.into(),
        };
    }

    /// Store the second transmitted checksum byte.
    pub(crate) fn set_second(&mut self, byte: u8, order: ChecksumOrder) {
        self.declared |= match order {
            ChecksumOrder::BigEndian => byte.into(),
            ChecksumOrder::LittleEndian => u16::from(byte) << 8,
        };
    }

    pub(crate) const fn declared(&self) -> u16 {
        self.declared
    }

    pub(crate) const fn computed(&self) -> u16 {
        self.computed
    }

    pub(crate) const fn verdict(&self) -> ChecksumVerdict {
        ChecksumVerdict::check(self.declared, self.computed)
    }
}

/// A preamble slot held an unexpected byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct PreambleMismatch {
    pub index: usize,
    pub expected: u8,
    pub found: u8,
}

/// The frame being assembled. One lives in the decoder for the whole session.
#[derive(Debug, Clone)]
pub(crate) struct FrameState {
    pos: usize,
    /// A data byte was already placed at `pos` in the current transaction.
    pos_taken: bool,
    length: Option<u8>,
    short: bool,
    code: Option<u8>,
    command: Command,
    payload: PayloadBytes,
    checksum: Checksum,
    start: Timestamp,
}

impl FrameState {
    pub fn new() -> Self {
        Self {
            pos: 0,
            pos_taken: false,
            length: None,
            short: false,
            code: None,
            command: Command::Unknown,
            payload: PayloadBytes::new(),
            checksum: Checksum::default(),
            start: 0,
        }
    }

    /// Byte position within the frame, preamble included.
    pub const fn position(&self) -> usize {
        self.pos
    }

    pub fn set_start(&mut self, time: Timestamp) {
        self.start = time;
    }

    /// Body position of the last checksum byte, once the length is known.
    fn last_pos(&self) -> Option<usize> {
        if self.short {
            return Some(SHORT_FRAME_LAST);
        }
        usize::from(self.length?).checked_sub(1)
    }

    /// Body position of the first checksum byte.
    fn first_checksum_pos(&self) -> Option<usize> {
        self.last_pos()?.checked_sub(1)
    }

    /// Place one data byte of the transaction `tx` at the next position.
    pub fn push_data(
        &mut self,
        profile: DeviceProfile,
        tx: &Transaction,
        byte: u8,
    ) -> Result<(), PreambleMismatch> {
        if self.pos_taken {
            self.pos += 1;
        }
        self.pos_taken = true;

        if self.pos < tx.preamble_len {
            let expected = [PREAMBLE_0, PREAMBLE_1][self.pos];
            if byte != expected {
                return Err(PreambleMismatch {
                    index: self.pos,
                    expected,
                    found: byte,
                });
            }
            return Ok(());
        }

        let body = self.pos - tx.preamble_len;
        let order = profile.checksum_order(tx.direction);
        match body {
            0 => {
                self.length = Some(byte);
                self.checksum.add(byte);
            }
            1 => {
                // summed against the length as declared so far
                self.accumulate(body, byte);
                if byte == SHORT_FRAME_MARKER {
                    self.code = self.length;
                    self.length = Some(SHORT_FRAME_LEN);
                    self.short = true;
                } else {
                    self.code = Some(byte);
                }
                self.command = self.code.map_or(Command::Unknown, |c| profile.resolve(c));
                trace!("frame code {:?} resolved to {}", self.code, self.command);
            }
            _ if Some(body) == self.first_checksum_pos() => self.checksum.set_first(byte, order),
            _ if Some(body) == self.last_pos() => self.checksum.set_second(byte, order),
            _ => {
                self.accumulate(body, byte);
                if self.payload.try_push(byte).is_err() {
                    warn!("BM I2C: payload overflow, dropping 0x{:02X}", byte);
                }
            }
        }
        Ok(())
    }

    fn accumulate(&mut self, body: usize, byte: u8) {
        if self.first_checksum_pos().map_or(false, |chk| body < chk) {
            self.checksum.add(byte);
        }
    }

    /// Close the transaction `tx` at `time`.
    ///
    /// Returns the finished frame and resets, if the stop lands on the last
    /// byte of the frame. Otherwise the position moves on to the next byte.
    pub fn stop(&mut self, tx: &Transaction, time: Timestamp) -> Option<DecodedFrame> {
        self.pos_taken = false;
        match (self.length, self.last_pos()) {
            (Some(length), Some(last)) if self.pos == last + tx.preamble_len => {
                let frame = DecodedFrame {
                    command: self.command,
                    direction: tx.direction,
                    length,
                    code: self.code,
                    payload: self.payload.clone(),
                    checksum: self.checksum,
                    start: self.start,
                    end: time,
                };
                *self = Self::new();
                Some(frame)
            }
            _ => {
                self.pos += 1;
                None
            }
        }
    }
}

/// A complete, decoded protocol frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    command: Command,
    direction: Direction,
    length: u8,
    code: Option<u8>,
    payload: PayloadBytes,
    checksum: Checksum,
    start: Timestamp,
    end: Timestamp,
}

impl DecodedFrame {
    /// Type name, with the `_resp` suffix on response variants.
    pub fn type_name(&self) -> &'static str {
        self.command.type_name(self.direction)
    }

    pub const fn command(&self) -> Command {
        self.command
    }

    /// Direction of the transaction that completed the frame.
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Declared length; 2 for short frames.
    pub const fn length(&self) -> u8 {
        self.length
    }

    /// Raw command code. `None` if the frame ended before its code byte.
    pub const fn code(&self) -> Option<u8> {
        self.code
    }

    /// Payload interpreted for the command and direction of the frame.
    pub fn payload(&self) -> Payload<'_> {
        Payload::interpret(self.command, self.direction, &self.payload)
    }

    pub fn raw_payload(&self) -> &[u8] {
        &self.payload
    }

    pub const fn checksum(&self) -> ChecksumVerdict {
        self.checksum.verdict()
    }

    pub const fn declared_checksum(&self) -> u16 {
        self.checksum.declared()
    }

    pub const fn computed_checksum(&self) -> u16 {
        self.checksum.computed()
    }

    /// Start of the first transaction of the frame.
    pub const fn start(&self) -> Timestamp {
        self.start
    }

    /// Stop of the last transaction of the frame.
    pub const fn end(&self) -> Timestamp {
        self.end
    }
}

impl fmt::Display for DecodedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} len={} code=", self.type_name(), self.direction, self.length)?;
        match self.code {
            Some(code) => write!(f, "{}", code)?,
            None => f.write_str("?")?,
        }
        write!(f, " payload={} checksum={}", self.payload(), self.checksum())
    }
}
