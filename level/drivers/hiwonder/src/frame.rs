use byteorder::{ByteOrder, LittleEndian};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use tracing::{trace, warn};

pub const FRAME_HEADER: u8 = 0x55;
/// Header, kind, 8 payload bytes, checksum.
pub const FRAME_LEN: usize = 11;

const ACC_SCALE: f32 = 16.0 * 9.80665 / 32768.0;
const QUATERNION_SCALE: f32 = 1.0 / 32768.0;
const TEMPERATURE_SCALE: f32 = 1.0 / 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum FrameKind {
    Time = 0x50,
    Acceleration = 0x51,
    Gyro = 0x52,
    Angle = 0x53,
    Magnetometer = 0x54,
    PortStatus = 0x55,
    Pressure = 0x56,
    Gps = 0x57,
    Velocity = 0x58,
    Quaternion = 0x59,
    GpsAccuracy = 0x5A,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadFrame {
    /// m/s², °C
    Acceleration { x: f32, y: f32, z: f32, temp: f32 },
    /// Raw LSB counts, °C
    Magnetometer { x: f32, y: f32, z: f32, temp: f32 },
    Quaternion { w: f32, x: f32, y: f32, z: f32 },
}

/// Low byte of the sum of the first ten bytes of a frame.
pub fn checksum(frame: &[u8]) -> u8 {
    frame.iter().take(10).fold(0u8, |acc, &b| acc.wrapping_add(b))
}

fn read_i16(payload: &[u8], index: usize) -> f32 {
    LittleEndian::read_i16(&payload[index * 2..index * 2 + 2]) as f32
}

fn decode(frame: &[u8]) -> Option<ReadFrame> {
    let payload = &frame[2..10];
    match FrameKind::from_u8(frame[1]) {
        Some(FrameKind::Acceleration) => Some(ReadFrame::Acceleration {
            x: read_i16(payload, 0) * ACC_SCALE,
            y: read_i16(payload, 1) * ACC_SCALE,
            z: read_i16(payload, 2) * ACC_SCALE,
            temp: read_i16(payload, 3) * TEMPERATURE_SCALE,
        }),
        Some(FrameKind::Magnetometer) => Some(ReadFrame::Magnetometer {
            x: read_i16(payload, 0),
            y: read_i16(payload, 1),
            z: read_i16(payload, 2),
            temp: read_i16(payload, 3) * TEMPERATURE_SCALE,
        }),
        Some(FrameKind::Quaternion) => Some(ReadFrame::Quaternion {
            w: read_i16(payload, 0) * QUATERNION_SCALE,
            x: read_i16(payload, 1) * QUATERNION_SCALE,
            y: read_i16(payload, 2) * QUATERNION_SCALE,
            z: read_i16(payload, 3) * QUATERNION_SCALE,
        }),
        Some(kind) => {
            trace!("Ignoring {:?} frame", kind);
            None
        }
        None => {
            trace!("Ignoring unknown frame kind {:#04x}", frame[1]);
            None
        }
    }
}

/// Reassembles frames from an arbitrarily chunked byte stream.
pub struct FrameParser {
    buffer: Vec<u8>,
    max_size: Option<usize>,
}

impl FrameParser {
    pub fn new(max_size: Option<usize>) -> Self {
        FrameParser {
            buffer: Vec::with_capacity(max_size.unwrap_or(FRAME_LEN * 8)),
            max_size,
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn parse(&mut self, data: &[u8]) -> Vec<ReadFrame> {
        self.buffer.extend_from_slice(data);
        if let Some(max) = self.max_size {
            if self.buffer.len() > max {
                let excess = self.buffer.len() - max;
                warn!("Frame buffer full, dropping {} bytes", excess);
                self.buffer.drain(..excess);
            }
        }

        let mut frames = Vec::new();
        let mut i = 0;
        while self.buffer.len() - i >= FRAME_LEN {
            if self.buffer[i] != FRAME_HEADER {
                i += 1;
                continue;
            }
            let candidate = &self.buffer[i..i + FRAME_LEN];
            if checksum(candidate) != candidate[FRAME_LEN - 1] {
                // Not a real header; resync on the next byte.
                i += 1;
                continue;
            }
            if let Some(frame) = decode(candidate) {
                frames.push(frame);
            }
            i += FRAME_LEN;
        }
        self.buffer.drain(..i);
        frames
    }
}
