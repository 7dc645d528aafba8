use nalgebra::UnitQuaternion;
use std::error::Error as StdError;
use std::fmt;
use std::sync::mpsc;

/// Standard gravity used by the level mappings (m/s²).
pub const STANDARD_GRAVITY: f32 = 9.81;

// --- Basic Types ---
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vector3 { x, y, z }
    }

    pub fn dot(&self, other: &Vector3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn norm_squared(&self) -> f32 {
        self.dot(self)
    }

    pub fn norm(&self) -> f32 {
        self.norm_squared().sqrt()
    }

    pub fn scale(&self, factor: f32) -> Vector3 {
        Vector3 {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn as_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from(v: [f32; 3]) -> Self {
        Vector3 { x: v[0], y: v[1], z: v[2] }
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector3(x={}, y={}, z={})", self.x, self.y, self.z)
    }
}

/// Orientation quaternion (WXYZ), rotating device coordinates into world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Quaternion { w: 1.0, x: 0.0, y: 0.0, z: 0.0 }
    }
}

impl Quaternion {
    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Quaternion { w, x, y, z }
    }

    /// Gravity reaction `[0, 0, g]` expressed in the device frame.
    ///
    /// This is what a platform gravity sensor reports: `+g` on Z when the device
    /// lies flat, screen up. Returns `None` for a zero-norm or non-finite
    /// quaternion, which has no orientation.
    pub fn gravity(&self) -> Option<Vector3> {
        let raw = nalgebra::Quaternion::new(self.w, self.x, self.y, self.z);
        if !raw.norm().is_finite() {
            return None;
        }
        let quaternion = UnitQuaternion::try_new(raw, f32::EPSILON)?;
        let up = nalgebra::Vector3::new(0.0, 0.0, STANDARD_GRAVITY);
        let g = quaternion.inverse() * up;
        let g = Vector3::new(g.x, g.y, g.z);
        g.is_finite().then_some(g)
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quaternion(w={}, x={}, y={}, z={})", self.w, self.x, self.y, self.z)
    }
}

// --- Sensor Channels ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorChannel {
    /// Acceleration including gravity (m/s²)
    Acceleration,
    /// Magnetic field (µT, or raw counts; only the direction matters)
    MagneticField,
    /// Gravity vector in device coordinates (m/s²)
    Gravity,
}

impl fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorChannel::Acceleration => write!(f, "acceleration"),
            SensorChannel::MagneticField => write!(f, "magnetic field"),
            SensorChannel::Gravity => write!(f, "gravity"),
        }
    }
}

/// The latest value of every channel, handed over as one unit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorPack {
    pub acceleration: Vector3,
    pub magnetic_field: Vector3,
    pub gravity: Vector3,
}

// --- Standard Error Type ---
#[derive(Debug)]
pub enum LevelError {
    /// Error originating from the underlying device communication (Serial)
    DeviceError(String),
    /// Error reading data from the device, or no new data is available
    ReadError(String),
    /// Error writing commands or configuration to the device
    WriteError(String),
    /// Error in the level or device configuration
    ConfigurationError(String),
    /// Sensor vectors are zero-length or collinear; no rotation exists
    DegenerateInput(String),
    /// Axis remap pair that does not form a right-handed basis
    InvalidRemap(String),
    /// Error related to multithreading locks (e.g., poisoned)
    LockError(String),
    /// Error sending a command to the reader thread
    CommandSendError(String),
    /// Catch-all for other errors
    Other(String),
}

impl LevelError {
    /// True when the cycle should be skipped rather than treated as a failure.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, LevelError::DegenerateInput(_))
    }
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::DeviceError(s) => write!(f, "Device error: {}", s),
            LevelError::ReadError(s) => write!(f, "Read error: {}", s),
            LevelError::WriteError(s) => write!(f, "Write error: {}", s),
            LevelError::ConfigurationError(s) => write!(f, "Configuration error: {}", s),
            LevelError::DegenerateInput(s) => write!(f, "Degenerate input: {}", s),
            LevelError::InvalidRemap(s) => write!(f, "Invalid axis remap: {}", s),
            LevelError::LockError(s) => write!(f, "Lock error: {}", s),
            LevelError::CommandSendError(s) => write!(f, "Command send error: {}", s),
            LevelError::Other(s) => write!(f, "Other level error: {}", s),
        }
    }
}

impl StdError for LevelError {}

impl From<serialport::Error> for LevelError {
    fn from(err: serialport::Error) -> Self {
        LevelError::DeviceError(format!("Serial error: {}", err))
    }
}

impl From<std::io::Error> for LevelError {
    fn from(err: std::io::Error) -> Self {
        LevelError::WriteError(format!("IO error: {}", err))
    }
}

impl<T> From<std::sync::PoisonError<T>> for LevelError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        LevelError::LockError(format!("Lock poisoned: {}", err))
    }
}

impl<T> From<mpsc::SendError<T>> for LevelError {
    fn from(err: mpsc::SendError<T>) -> Self {
        LevelError::CommandSendError(format!("Failed to send command: {}", err))
    }
}

pub trait SensorSource {
    /// Retrieves the latest combined sensor readings.
    fn get_data(&self) -> Result<SensorPack, LevelError>;

    fn stop(&self) -> Result<(), LevelError>;
}
