#![allow(dead_code)]

use bm_i2c_proto::{BusEvent, DecodedFrame, Decoder, DeviceProfile, Timestamp};

pub const APW: u8 = 0x10;
pub const PIC: u8 = 0x20;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Records a bus conversation, advancing the clock by 10 per event.
#[derive(Default)]
pub struct Bus {
    events: Vec<BusEvent<'static>>,
    time: Timestamp,
}

impl Bus {
    pub fn new() -> Bus {
        Default::default()
    }

    /// Time of the next event.
    pub fn now(&self) -> Timestamp {
        self.time + 10
    }

    fn tick(&mut self) -> Timestamp {
        self.time += 10;
        self.time
    }

    pub fn start(&mut self) -> &mut Self {
        let time = self.tick();
        self.events.push(BusEvent::Start { time });
        self
    }

    pub fn address(&mut self, address: u8, read: bool) -> &mut Self {
        let time = self.tick();
        self.events.push(BusEvent::Address {
            time,
            address,
            read,
        });
        self
    }

    pub fn data(&mut self, bytes: &[u8]) -> &mut Self {
        for byte in bytes {
            let time = self.tick();
            self.events.push(BusEvent::Data { time, byte: *byte });
        }
        self
    }

    pub fn stop(&mut self) -> &mut Self {
        let time = self.tick();
        self.events.push(BusEvent::Stop { time });
        self
    }

    pub fn error(&mut self, message: &'static str) -> &mut Self {
        let time = self.tick();
        self.events.push(BusEvent::Error { time, message });
        self
    }

    /// One transaction carrying all of `bytes`.
    pub fn transaction(&mut self, address: u8, read: bool, bytes: &[u8]) -> &mut Self {
        self.start().address(address, read).data(bytes).stop()
    }

    /// One transaction per byte, the way the devices talk.
    pub fn bytewise(&mut self, address: u8, read: bool, bytes: &[u8]) -> &mut Self {
        for byte in bytes {
            self.transaction(address, read, &[*byte]);
        }
        self
    }

    pub fn events(&self) -> &[BusEvent<'static>] {
        &self.events
    }
}

pub fn decode(decoder: &mut Decoder, bus: &Bus) -> Vec<DecodedFrame> {
    decoder.frames(bus.events().iter().copied()).collect()
}

pub fn decode_as(profile: DeviceProfile, bus: &Bus) -> Vec<DecodedFrame> {
    decode(&mut Decoder::new(profile), bus)
}

/// Build a frame: optional preamble, length, code, payload and a checksum
/// over length, code and payload.
pub fn framed(preamble: bool, little_endian: bool, code: u8, payload: &[u8]) -> Vec<u8> {
    let mut body = vec![(payload.len() + 4) as u8, code];
    body.extend_from_slice(payload);
    let sum = body.iter().fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)));

    let mut out = Vec::new();
    if preamble {
        out.extend_from_slice(&[0x55, 0xAA]);
    }
    out.extend_from_slice(&body);
    if little_endian {
        out.extend_from_slice(&sum.to_le_bytes());
    } else {
        out.extend_from_slice(&sum.to_be_bytes());
    }
    out
}
