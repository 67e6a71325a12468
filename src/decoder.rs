//! See [`Decoder`] for more details.

use log::{debug, trace, warn};

use crate::frame::{DecodedFrame, FrameState};
use crate::profile::DeviceProfile;
use crate::types::{BusEvent, Direction, Timestamp};

/// The part of a bus transaction the frame assembler needs, present only for
/// transactions addressed to the configured device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Transaction {
    pub direction: Direction,
    pub preamble_len: usize,
}

impl Transaction {
    pub fn new(profile: DeviceProfile, direction: Direction) -> Self {
        Self {
            direction,
            preamble_len: profile.preamble_len(direction),
        }
    }
}

/// Counters for the anomalies seen during a session. None of them stop decoding.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    /// Frames emitted.
    pub frames: u64,
    /// Preamble slots holding something other than `0x55 0xAA`.
    pub preamble_mismatches: u64,
    /// Error events from the bus-event source.
    pub bus_errors: u64,
    /// Transactions addressed to other devices.
    pub foreign_transactions: u64,
}

/// Sans-io decoder for one device on the bus.
///
/// Feed it the bus events in time order with [`handle()`](Self::handle()),
/// it returns a [`DecodedFrame`] on the stop event that completes a frame.
/// A frame may span several transactions, the byte position carries over
/// until the frame is complete.
///
/// # Example
///
/// ```
/// use bm_i2c_proto::{BusEvent, ChecksumVerdict, Decoder, DeviceProfile};
///
/// let mut decoder = Decoder::new(DeviceProfile::Controller);
/// let mut frames = Vec::new();
/// // dsPIC init command, one byte per transaction
/// for (i, byte) in [0x55, 0xAA, 0x04, 0x07, 0x00, 0x0b].iter().enumerate() {
///     let t = i as u64 * 100;
///     let events = [
///         BusEvent::Start { time: t },
///         BusEvent::Address { time: t + 10, address: 0x20, read: false },
///         BusEvent::Data { time: t + 20, byte: *byte },
///         BusEvent::Stop { time: t + 30 },
///     ];
///     frames.extend(decoder.frames(events.iter().copied()));
/// }
/// assert_eq!(frames.len(), 1);
/// assert_eq!(frames[0].type_name(), "init");
/// assert_eq!(frames[0].checksum(), ChecksumVerdict::Valid);
/// assert_eq!((frames[0].start(), frames[0].end()), (0, 530));
/// ```
#[derive(Debug, Clone)]
pub struct Decoder {
    profile: DeviceProfile,
    tx_start: Timestamp,
    transaction: Option<Transaction>,
    frame: FrameState,
    diagnostics: Diagnostics,
}

impl Decoder {
    /// Create a decoder for the device selected by `profile`.
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            profile,
            tx_start: 0,
            transaction: None,
            frame: FrameState::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub const fn profile(&self) -> DeviceProfile {
        self.profile
    }

    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Byte position of the frame in progress, preamble included.
    pub const fn position(&self) -> usize {
        self.frame.position()
    }

    /// Drop the frame in progress and the current transaction.
    pub fn reset(&mut self) {
        self.transaction = None;
        self.frame = FrameState::new();
    }

    /// Process one bus event.
    pub fn handle(&mut self, event: &BusEvent<'_>) -> Option<DecodedFrame> {
        match *event {
            BusEvent::Error { time, message } => {
                warn!("BM I2C: bus error at {}: {}", time, message);
                self.diagnostics.bus_errors += 1;
                None
            }
            BusEvent::Start { time } => {
                self.tx_start = time;
                self.transaction = None;
                None
            }
            BusEvent::Address { address, read, .. } => {
                self.classify(address, read);
                None
            }
            BusEvent::Data { byte, .. } => {
                let tx = self.transaction?;
                if let Err(m) = self.frame.push_data(self.profile, &tx, byte) {
                    warn!(
                        "BM I2C: malformed command, preamble[{}]=0x{:02X}, expected 0x{:02X}",
                        m.index, m.found, m.expected
                    );
                    self.diagnostics.preamble_mismatches += 1;
                }
                None
            }
            BusEvent::Stop { time } => {
                let tx = self.transaction.take()?;
                let frame = self.frame.stop(&tx, time)?;
                debug!("BM I2C: {}", frame);
                self.diagnostics.frames += 1;
                Some(frame)
            }
        }
    }

    /// Iterator over the frames decoded from `events`.
    pub fn frames<'d, 'e, I>(&'d mut self, events: I) -> Frames<'d, I::IntoIter>
    where
        I: IntoIterator<Item = BusEvent<'e>>,
    {
        Frames {
            decoder: self,
            events: events.into_iter(),
        }
    }

    fn classify(&mut self, address: u8, read: bool) {
        if address != self.profile.address() {
            trace!("BM I2C: not for us: i2c@0x{:02X}", address);
            self.diagnostics.foreign_transactions += 1;
            self.transaction = None;
            return;
        }
        // a repeated start keeps the start of the frame's first transaction
        if self.frame.position() == 0 {
            self.frame.set_start(self.tx_start);
        }
        self.transaction = Some(Transaction::new(self.profile, Direction::from_read(read)));
    }
}

/// Iterator returned by [`Decoder::frames()`].
#[derive(Debug)]
pub struct Frames<'d, I> {
    decoder: &'d mut Decoder,
    events: I,
}

impl<'d, 'e, I> Iterator for Frames<'d, I>
where
    I: Iterator<Item = BusEvent<'e>>,
{
    type Item = DecodedFrame;

    fn next(&mut self) -> Option<Self::Item> {
        for event in &mut self.events {
            if let Some(frame) = self.decoder.handle(&event) {
                return Some(frame);
            }
        }
        None
    }
}
