//! Orientation angles and inclination extracted from the matrices.

use crate::matrix::{InclinationMatrix, RotationMatrix};
use std::fmt;

/// Orientation angles in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientationAngles {
    /// Rotation about the vertical axis (-π to π)
    pub azimuth: f32,
    /// Lateral tilt (-π/2 to π/2)
    pub pitch: f32,
    /// Longitudinal tilt (-π to π)
    pub roll: f32,
}

impl OrientationAngles {
    /// `[azimuth, pitch, roll]`
    pub fn as_array(&self) -> [f32; 3] {
        [self.azimuth, self.pitch, self.roll]
    }

    pub fn to_degrees(&self) -> [f32; 3] {
        [self.azimuth.to_degrees(), self.pitch.to_degrees(), self.roll.to_degrees()]
    }
}

impl From<[f32; 3]> for OrientationAngles {
    fn from(v: [f32; 3]) -> Self {
        OrientationAngles { azimuth: v[0], pitch: v[1], roll: v[2] }
    }
}

impl fmt::Display for OrientationAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OrientationAngles(azimuth={}, pitch={}, roll={})",
            self.azimuth, self.pitch, self.roll
        )
    }
}

/// Decomposes a rotation matrix into azimuth, pitch and roll.
pub fn extract_orientation_angles(rotation: &RotationMatrix) -> OrientationAngles {
    let r = rotation.as_array();
    OrientationAngles {
        azimuth: r[1].atan2(r[4]),
        pitch: (-r[7]).clamp(-1.0, 1.0).asin(),
        roll: (-r[6]).atan2(r[8]),
    }
}

/// Inclination angle in radians.
pub fn extract_inclination(inclination: &InclinationMatrix) -> f32 {
    let i = inclination.as_array();
    i[5].atan2(i[4])
}
