//! Latest-value merge of the three sensor channels.

use level_traits::{SensorChannel, SensorPack, Vector3};

/// Three single-slot cells, one per channel, with a changed flag.
///
/// Each channel is latest-value-wins. A pack is emitted once every channel has
/// a value and at least one update arrived since the previous emission.
#[derive(Debug, Clone, Default)]
pub struct LatestReadings {
    acceleration: Option<Vector3>,
    magnetic_field: Option<Vector3>,
    gravity: Option<Vector3>,
    changed: bool,
}

impl LatestReadings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, channel: SensorChannel, value: Vector3) {
        let slot = match channel {
            SensorChannel::Acceleration => &mut self.acceleration,
            SensorChannel::MagneticField => &mut self.magnetic_field,
            SensorChannel::Gravity => &mut self.gravity,
        };
        *slot = Some(value);
        self.changed = true;
    }

    pub fn update_acceleration(&mut self, value: Vector3) {
        self.update(SensorChannel::Acceleration, value);
    }

    pub fn update_magnetic_field(&mut self, value: Vector3) {
        self.update(SensorChannel::MagneticField, value);
    }

    pub fn update_gravity(&mut self, value: Vector3) {
        self.update(SensorChannel::Gravity, value);
    }

    pub fn get(&self, channel: SensorChannel) -> Option<Vector3> {
        match channel {
            SensorChannel::Acceleration => self.acceleration,
            SensorChannel::MagneticField => self.magnetic_field,
            SensorChannel::Gravity => self.gravity,
        }
    }

    /// True once every channel has received a value.
    pub fn is_ready(&self) -> bool {
        self.acceleration.is_some() && self.magnetic_field.is_some() && self.gravity.is_some()
    }

    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// The combined readings, without consuming the change.
    pub fn peek(&self) -> Option<SensorPack> {
        Some(SensorPack {
            acceleration: self.acceleration?,
            magnetic_field: self.magnetic_field?,
            gravity: self.gravity?,
        })
    }

    /// Emits the combined readings if ready and changed since the last emission.
    pub fn take(&mut self) -> Option<SensorPack> {
        if !self.changed {
            return None;
        }
        let pack = self.peek()?;
        self.changed = false;
        Some(pack)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
