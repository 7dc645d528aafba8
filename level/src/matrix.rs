use std::fmt;

/// 3x3 rotation matrix, row-major.
///
/// Rows are the world East, North and Up axes expressed in device coordinates,
/// so `R * v_device = v_world`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationMatrix(pub [f32; 9]);

impl RotationMatrix {
    pub const IDENTITY: RotationMatrix =
        RotationMatrix([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    pub fn from_rows(r0: [f32; 3], r1: [f32; 3], r2: [f32; 3]) -> Self {
        RotationMatrix([r0[0], r0[1], r0[2], r1[0], r1[1], r1[2], r2[0], r2[1], r2[2]])
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.0[row * 3 + col]
    }

    pub fn row(&self, row: usize) -> [f32; 3] {
        [self.0[row * 3], self.0[row * 3 + 1], self.0[row * 3 + 2]]
    }

    pub fn as_array(&self) -> &[f32; 9] {
        &self.0
    }

    pub fn determinant(&self) -> f32 {
        let m = &self.0;
        m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6])
            + m[2] * (m[3] * m[7] - m[4] * m[6])
    }

    /// Largest deviation of `R * Rᵀ` from the identity.
    pub fn orthonormality_error(&self) -> f32 {
        let mut worst = 0.0f32;
        for i in 0..3 {
            for j in 0..3 {
                let a = self.row(i);
                let b = self.row(j);
                let dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
                let expected = if i == j { 1.0 } else { 0.0 };
                worst = worst.max((dot - expected).abs());
            }
        }
        worst
    }
}

impl Default for RotationMatrix {
    fn default() -> Self {
        RotationMatrix::IDENTITY
    }
}

impl fmt::Display for RotationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            let r = self.row(row);
            writeln!(f, "[{: >8.4} {: >8.4} {: >8.4}]", r[0], r[1], r[2])?;
        }
        Ok(())
    }
}

/// Inclination matrix produced alongside the rotation matrix.
///
/// Layout is `[1, 0, 0, 0, c, s, 0, -s, c]`; only `c` and `s` carry information.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InclinationMatrix(pub [f32; 9]);

impl InclinationMatrix {
    pub fn from_cos_sin(c: f32, s: f32) -> Self {
        InclinationMatrix([1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c])
    }

    pub fn as_array(&self) -> &[f32; 9] {
        &self.0
    }
}

impl Default for InclinationMatrix {
    fn default() -> Self {
        InclinationMatrix::from_cos_sin(1.0, 0.0)
    }
}
