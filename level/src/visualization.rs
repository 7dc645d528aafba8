//! Maps orientation onto the level indicator: a vertical offset and a rotation.

use crate::orientation::OrientationAngles;
use level_traits::{Vector3, STANDARD_GRAVITY};
use std::f64::consts::PI;
use std::fmt;

/// Damping applied to the gravity-driven rotation.
pub const ROTATION_DAMPING: f64 = 4.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VisualizationOutput {
    /// Pitch normalized to roughly [-1, 1] (degrees / 180)
    pub delta: f32,
    /// Offset along the indicator track, in the units of the reference height
    pub vertical_offset: f32,
    /// Indicator rotation (deg)
    pub rotation_degrees: f32,
}

impl fmt::Display for VisualizationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Visualization(delta={}, offset={}, rotation={}°)",
            self.delta, self.vertical_offset, self.rotation_degrees
        )
    }
}

/// Derives the indicator offset from pitch and its rotation from gravity X.
///
/// `gravity.x` is not clamped: values past ±9.81 m/s² rotate past ±90°.
pub fn compute_visualization(
    angles: &OrientationAngles,
    gravity: &Vector3,
    reference_height: f32,
) -> VisualizationOutput {
    let delta = (angles.pitch as f64).to_degrees() / 180.0;
    let vertical_offset = reference_height as f64 * delta;
    let turns = (gravity.x / STANDARD_GRAVITY) as f64;
    let rotation = (2.0 * PI * turns).to_degrees() / ROTATION_DAMPING;

    VisualizationOutput {
        delta: delta as f32,
        vertical_offset: vertical_offset as f32,
        rotation_degrees: rotation as f32,
    }
}
