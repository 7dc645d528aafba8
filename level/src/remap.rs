//! Axis remapping of a rotation matrix into another device-axis convention.

use crate::matrix::RotationMatrix;
use level_traits::LevelError;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// A signed device axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Axis {
    #[strum(to_string = "x")]
    #[serde(rename = "x")]
    X,
    #[strum(to_string = "y")]
    #[serde(rename = "y")]
    Y,
    #[strum(to_string = "z")]
    #[serde(rename = "z")]
    Z,
    #[strum(to_string = "-x")]
    #[serde(rename = "-x")]
    MinusX,
    #[strum(to_string = "-y")]
    #[serde(rename = "-y")]
    MinusY,
    #[strum(to_string = "-z")]
    #[serde(rename = "-z")]
    MinusZ,
}

impl Axis {
    /// Column index of the axis (0 = X, 1 = Y, 2 = Z).
    pub fn index(&self) -> usize {
        match self {
            Axis::X | Axis::MinusX => 0,
            Axis::Y | Axis::MinusY => 1,
            Axis::Z | Axis::MinusZ => 2,
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, Axis::MinusX | Axis::MinusY | Axis::MinusZ)
    }

    fn from_parts(index: usize, negative: bool) -> Axis {
        match (index, negative) {
            (0, false) => Axis::X,
            (1, false) => Axis::Y,
            (2, false) => Axis::Z,
            (0, true) => Axis::MinusX,
            (1, true) => Axis::MinusY,
            _ => Axis::MinusZ,
        }
    }
}

/// A validated remap: world X onto device `x`, world Y onto device `y`, Z derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRemap {
    x: Axis,
    y: Axis,
    z: Axis,
}

impl AxisRemap {
    pub const IDENTITY: AxisRemap = AxisRemap { x: Axis::X, y: Axis::Y, z: Axis::Z };

    /// Validates the pair and derives the Z axis of the right-handed result.
    pub fn new(x: Axis, y: Axis) -> Result<Self, LevelError> {
        let xi = x.index();
        let yi = y.index();
        if xi == yi {
            return Err(LevelError::InvalidRemap(format!(
                "{} and {} lie on the same axis",
                x, y
            )));
        }

        let zi = 3 - xi - yi;
        let cyclic = (zi + 1) % 3 == xi && (zi + 2) % 3 == yi;
        let z_negative = x.is_negative() ^ y.is_negative() ^ !cyclic;

        Ok(AxisRemap { x, y, z: Axis::from_parts(zi, z_negative) })
    }

    pub fn x(&self) -> Axis {
        self.x
    }

    pub fn y(&self) -> Axis {
        self.y
    }

    pub fn z(&self) -> Axis {
        self.z
    }

    /// Moves column 0/1/2 of every row onto the x/y/z target column, negated
    /// for minus axes.
    pub fn apply(&self, rotation: &RotationMatrix) -> RotationMatrix {
        let mut out = [0.0f32; 9];
        for row in 0..3 {
            let src = rotation.row(row);
            for (source_col, axis) in [self.x, self.y, self.z].iter().enumerate() {
                let value = src[source_col];
                out[row * 3 + axis.index()] = if axis.is_negative() { -value } else { value };
            }
        }
        RotationMatrix(out)
    }
}

impl Default for AxisRemap {
    fn default() -> Self {
        AxisRemap::IDENTITY
    }
}

/// One-shot remap. Prefer building an [`AxisRemap`] once at startup.
pub fn remap_axes(
    rotation: &RotationMatrix,
    x: Axis,
    y: Axis,
) -> Result<RotationMatrix, LevelError> {
    Ok(AxisRemap::new(x, y)?.apply(rotation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const ALL: [Axis; 6] = [Axis::X, Axis::Y, Axis::Z, Axis::MinusX, Axis::MinusY, Axis::MinusZ];

    fn sample_rotation() -> RotationMatrix {
        // Rotation of 30° about Z followed by 20° about X.
        let (s1, c1) = 30f32.to_radians().sin_cos();
        let (s2, c2) = 20f32.to_radians().sin_cos();
        RotationMatrix::from_rows(
            [c1, -s1 * c2, s1 * s2],
            [s1, c1 * c2, -c1 * s2],
            [0.0, s2, c2],
        )
    }

    #[test]
    fn test_identity_remap_is_noop() {
        let r = sample_rotation();
        assert_eq!(remap_axes(&r, Axis::X, Axis::Y).unwrap(), r);
    }

    #[test]
    fn test_level_view_convention_derives_minus_y() {
        let remap = AxisRemap::new(Axis::MinusZ, Axis::X).unwrap();
        assert_eq!(remap.z(), Axis::MinusY);

        let out = remap.apply(&RotationMatrix::IDENTITY);
        // Columns: x -> -Z, y -> X, z -> -Y.
        assert_eq!(
            out,
            RotationMatrix::from_rows([0.0, 0.0, -1.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0])
        );
    }

    #[test]
    fn test_same_or_opposite_axes_are_rejected() {
        for a in ALL {
            for b in ALL {
                let result = AxisRemap::new(a, b);
                if a.index() == b.index() {
                    assert!(matches!(result, Err(LevelError::InvalidRemap(_))), "{} {}", a, b);
                } else {
                    assert!(result.is_ok(), "{} {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_every_valid_remap_stays_right_handed() {
        let r = sample_rotation();
        for a in ALL {
            for b in ALL {
                if let Ok(remap) = AxisRemap::new(a, b) {
                    let out = remap.apply(&r);
                    assert!(out.orthonormality_error() < 1e-5, "{} {}", a, b);
                    assert!((out.determinant() - 1.0).abs() < 1e-5, "{} {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_axis_spelling_round_trips() {
        for a in ALL {
            assert_eq!(Axis::from_str(&a.to_string()).unwrap(), a);
        }
        assert_eq!(Axis::from_str("-z").unwrap(), Axis::MinusZ);
        assert!(Axis::from_str("w").is_err());
    }
}
