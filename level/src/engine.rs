use crate::config::LevelConfig;
use crate::matrix::{InclinationMatrix, RotationMatrix};
use crate::orientation::{extract_inclination, extract_orientation_angles, OrientationAngles};
use crate::remap::AxisRemap;
use crate::rotation::compute_rotation_and_inclination;
use crate::visualization::{compute_visualization, VisualizationOutput};
use level_traits::{LevelError, SensorPack, Vector3};
use log::{debug, warn};
use std::fmt;

/// Everything one engine cycle produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelFrame {
    /// Rotation matrix after the axis remap
    pub rotation: RotationMatrix,
    pub inclination_matrix: InclinationMatrix,
    /// Inclination (rad)
    pub inclination: f32,
    pub angles: OrientationAngles,
    pub visualization: VisualizationOutput,
    /// Gravity vector the rotation was derived from (m/s²)
    pub gravity: Vector3,
}

impl fmt::Display for LevelFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.rotation.as_array();
        let [azimuth, pitch, roll] = self.angles.to_degrees();
        writeln!(f, "level:       {: >10.1}°", pitch)?;
        writeln!(f, "delta:       {: >10.4}", self.visualization.delta)?;
        writeln!(f, "offset:      {: >10.1}", self.visualization.vertical_offset)?;
        writeln!(f, "rotation:    {: >10.2}°", self.visualization.rotation_degrees)?;
        writeln!(f, "inclination: {: >10.3} rad", self.inclination)?;
        writeln!(f, "rotation matrix:")?;
        writeln!(f, "  {: >10.4} {: >10.4} {: >10.4}", r[0], r[1], r[2])?;
        writeln!(f, "  {: >10.4} {: >10.4} {: >10.4}", r[3], r[4], r[5])?;
        writeln!(f, "  {: >10.4} {: >10.4} {: >10.4}", r[6], r[7], r[8])?;
        writeln!(
            f,
            "angles (rad): azimuth: {: >8.3} pitch: {: >8.3} roll: {: >8.3}",
            self.angles.azimuth, self.angles.pitch, self.angles.roll
        )?;
        writeln!(
            f,
            "angles (°):   azimuth: {: >8.1} pitch: {: >8.1} roll: {: >8.1}",
            azimuth, pitch, roll
        )?;
        write!(
            f,
            "gravity:      x: {: >8.3} y: {: >8.3} z: {: >8.3}",
            self.gravity.x, self.gravity.y, self.gravity.z
        )
    }
}

/// The full orientation pipeline with a remap validated up front.
#[derive(Debug, Clone, Copy)]
pub struct LevelEngine {
    remap: AxisRemap,
    reference_height: f32,
}

impl LevelEngine {
    pub fn new(config: &LevelConfig) -> Result<Self, LevelError> {
        config.validate()?;
        Ok(LevelEngine {
            remap: config.remap()?,
            reference_height: config.reference_height,
        })
    }

    pub fn remap(&self) -> AxisRemap {
        self.remap
    }

    pub fn reference_height(&self) -> f32 {
        self.reference_height
    }

    /// Runs one cycle: rotation, remap, angles, inclination, visualization.
    pub fn compute(&self, pack: &SensorPack) -> Result<LevelFrame, LevelError> {
        let (rotation, inclination_matrix) =
            compute_rotation_and_inclination(&pack.acceleration, &pack.magnetic_field)?;
        let rotation = self.remap.apply(&rotation);
        let angles = extract_orientation_angles(&rotation);
        let inclination = extract_inclination(&inclination_matrix);
        let visualization = compute_visualization(&angles, &pack.gravity, self.reference_height);

        Ok(LevelFrame {
            rotation,
            inclination_matrix,
            inclination,
            angles,
            visualization,
            gravity: pack.gravity,
        })
    }
}

/// Engine plus the last good frame, kept across degenerate cycles.
#[derive(Debug, Clone)]
pub struct LevelState {
    engine: LevelEngine,
    last: Option<LevelFrame>,
    skipped: u64,
}

impl LevelState {
    pub fn new(engine: LevelEngine) -> Self {
        LevelState { engine, last: None, skipped: 0 }
    }

    pub fn engine(&self) -> &LevelEngine {
        &self.engine
    }

    pub fn last(&self) -> Option<&LevelFrame> {
        self.last.as_ref()
    }

    /// Number of cycles skipped because of degenerate input.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Processes one pack. Degenerate input leaves the previous frame in place.
    pub fn process(&mut self, pack: &SensorPack) -> Option<&LevelFrame> {
        match self.engine.compute(pack) {
            Ok(frame) => {
                debug!(
                    "pitch={} offset={} rotation={}",
                    frame.angles.pitch,
                    frame.visualization.vertical_offset,
                    frame.visualization.rotation_degrees
                );
                self.last = Some(frame);
            }
            Err(e) => {
                self.skipped += 1;
                warn!("Skipping level update: {}", e);
            }
        }
        self.last.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remap::Axis;

    /// Device standing on its bottom edge, screen facing the user, user facing north.
    fn upright_pack() -> SensorPack {
        SensorPack {
            acceleration: Vector3::new(0.0, 9.81, 0.0),
            magnetic_field: Vector3::new(0.0, -30.0, -16.0),
            gravity: Vector3::new(0.0, 9.81, 0.0),
        }
    }

    #[test]
    fn test_invalid_remap_fails_at_construction() {
        let config = LevelConfig {
            remap_x: Axis::X,
            remap_y: Axis::MinusX,
            ..LevelConfig::default()
        };
        assert!(matches!(LevelEngine::new(&config), Err(LevelError::InvalidRemap(_))));
    }

    #[test]
    fn test_upright_device_is_level() {
        let engine = LevelEngine::new(&LevelConfig::default()).unwrap();
        let frame = engine.compute(&upright_pack()).unwrap();
        assert!(frame.angles.pitch.abs() < 1e-6);
        assert!(frame.visualization.vertical_offset.abs() < 1e-3);
        assert_eq!(frame.visualization.rotation_degrees, 0.0);
        assert!(frame.rotation.orthonormality_error() < 1e-5);
    }

    #[test]
    fn test_flat_device_pitches_a_quarter_turn() {
        let pack = SensorPack {
            acceleration: Vector3::new(0.0, 0.0, 9.81),
            magnetic_field: Vector3::new(0.0, 16.0, -30.0),
            gravity: Vector3::new(0.0, 0.0, 9.81),
        };
        let engine = LevelEngine::new(&LevelConfig::default()).unwrap();
        let frame = engine.compute(&pack).unwrap();
        assert!((frame.angles.pitch - std::f32::consts::FRAC_PI_2).abs() < 1e-3);
        assert!((frame.visualization.vertical_offset - 500.0).abs() < 1.0);
    }

    #[test]
    fn test_side_tilt_rotates_indicator() {
        let (s, c) = 30f32.to_radians().sin_cos();
        let up = Vector3::new(9.81 * s, 9.81 * c, 0.0);
        let pack = SensorPack {
            acceleration: up,
            magnetic_field: Vector3::new(-30.0 * s, -30.0 * c, -16.0),
            gravity: up,
        };
        let engine = LevelEngine::new(&LevelConfig::default()).unwrap();
        let frame = engine.compute(&pack).unwrap();
        assert!(frame.angles.pitch.abs() < 1e-5);
        assert!((frame.visualization.rotation_degrees - 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_state_keeps_last_frame_on_degenerate_input() {
        let engine = LevelEngine::new(&LevelConfig::default()).unwrap();
        let mut state = LevelState::new(engine);

        let degenerate = SensorPack {
            acceleration: Vector3::new(0.0, 0.0, 1.0),
            magnetic_field: Vector3::new(0.0, 0.0, 1.0),
            gravity: Vector3::default(),
        };
        assert!(state.process(&degenerate).is_none());
        assert_eq!(state.skipped(), 1);

        let good = *state.process(&upright_pack()).unwrap();
        let kept = *state.process(&degenerate).unwrap();
        assert_eq!(good, kept);
        assert_eq!(state.skipped(), 2);
    }

    #[test]
    fn test_overflowing_pack_is_skipped() {
        let engine = LevelEngine::new(&LevelConfig::default()).unwrap();
        let huge = SensorPack {
            acceleration: Vector3::new(0.0, 0.0, 1e20),
            magnetic_field: Vector3::new(0.0, 1e20, 0.0),
            gravity: Vector3::default(),
        };
        assert!(engine.compute(&huge).unwrap_err().is_degenerate());

        let mut state = LevelState::new(engine);
        let good = *state.process(&upright_pack()).unwrap();
        assert_eq!(*state.process(&huge).unwrap(), good);
        assert_eq!(state.skipped(), 1);
    }

    #[test]
    fn test_readout_lists_every_field() {
        let engine = LevelEngine::new(&LevelConfig::default()).unwrap();
        let text = engine.compute(&upright_pack()).unwrap().to_string();
        let labels = [
            "delta:",
            "offset:",
            "inclination:",
            "rotation matrix:",
            "angles (rad):",
            "gravity:",
        ];
        for label in labels {
            assert!(text.contains(label), "missing {} in\n{}", label, text);
        }
    }
}
