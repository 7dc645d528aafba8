//! Orientation engine for a bubble level.
//!
//! Turns the latest acceleration, magnetic field and gravity vectors into a
//! rotation matrix, orientation angles, and the offset and rotation of a level
//! indicator.

pub mod config;
pub mod engine;
pub mod latest;
pub mod matrix;
pub mod orientation;
pub mod remap;
pub mod rotation;
pub mod visualization;

pub use level_traits::{
    LevelError, Quaternion, SensorChannel, SensorPack, SensorSource, Vector3, STANDARD_GRAVITY,
};

pub use config::LevelConfig;
pub use engine::{LevelEngine, LevelFrame, LevelState};
pub use latest::LatestReadings;
pub use matrix::{InclinationMatrix, RotationMatrix};
pub use orientation::{extract_inclination, extract_orientation_angles, OrientationAngles};
pub use remap::{remap_axes, Axis, AxisRemap};
pub use rotation::compute_rotation_and_inclination;
pub use visualization::{compute_visualization, VisualizationOutput};
