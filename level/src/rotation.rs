//! Rotation and inclination matrices from acceleration and magnetic field.

use crate::matrix::{InclinationMatrix, RotationMatrix};
use level_traits::{LevelError, Vector3, STANDARD_GRAVITY};
use log::debug;

/// Accelerations below 10% of g (squared) count as free fall.
pub const FREE_FALL_GRAVITY_SQUARED: f32 = 0.01 * STANDARD_GRAVITY * STANDARD_GRAVITY;

/// Minimum magnitude of `magnetic_field × acceleration` before normalization.
pub const MIN_CROSS_NORM: f32 = 0.1;

/// Builds the device-to-world rotation matrix and the inclination matrix.
///
/// Rows of the rotation matrix are `H = normalize(E × A)` (east),
/// `M = A × H` (north) and `A = normalize(acceleration)` (up), where `E` is the
/// magnetic field.
///
/// Fails with [`LevelError::DegenerateInput`] when the acceleration is too
/// small, the two vectors are collinear, the magnetic field is zero, or a
/// component is not finite.
pub fn compute_rotation_and_inclination(
    acceleration: &Vector3,
    magnetic_field: &Vector3,
) -> Result<(RotationMatrix, InclinationMatrix), LevelError> {
    if !acceleration.is_finite() || !magnetic_field.is_finite() {
        return Err(LevelError::DegenerateInput(format!(
            "non-finite sensor vector: acceleration={}, magnetic field={}",
            acceleration, magnetic_field
        )));
    }

    let norm_sq_a = acceleration.norm_squared();
    let norm_e = magnetic_field.norm();
    if !norm_sq_a.is_finite() || !norm_e.is_finite() {
        return Err(LevelError::DegenerateInput(format!(
            "sensor vector magnitude overflows: |a|² = {}, |E| = {}",
            norm_sq_a, norm_e
        )));
    }
    if norm_sq_a < FREE_FALL_GRAVITY_SQUARED {
        return Err(LevelError::DegenerateInput(format!(
            "acceleration too small (|a|² = {})",
            norm_sq_a
        )));
    }

    let h = magnetic_field.cross(acceleration);
    let norm_h = h.norm();
    if !norm_h.is_finite() {
        return Err(LevelError::DegenerateInput(format!(
            "|E × a| overflows ({})",
            norm_h
        )));
    }
    if norm_h < MIN_CROSS_NORM {
        return Err(LevelError::DegenerateInput(format!(
            "acceleration and magnetic field are collinear or zero (|E × a| = {})",
            norm_h
        )));
    }

    let h = h.scale(1.0 / norm_h);
    let a = acceleration.scale(1.0 / norm_sq_a.sqrt());
    let m = a.cross(&h);

    let rotation = RotationMatrix::from_rows(h.as_array(), m.as_array(), a.as_array());

    let inv_e = 1.0 / norm_e;
    let c = magnetic_field.dot(&m) * inv_e;
    let s = magnetic_field.dot(&a) * inv_e;
    let inclination = InclinationMatrix::from_cos_sin(c, s);

    debug!("rotation rows: H={}, M={}, A={}", h, m, a);
    Ok((rotation, inclination))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32, tol: f32) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {} got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_flat_north_facing_device_is_identity() {
        let a = Vector3::new(0.0, 0.0, 9.81);
        let m = Vector3::new(0.0, 16.0, -30.0);
        let (r, _) = compute_rotation_and_inclination(&a, &m).unwrap();

        let up = r.row(2);
        assert_close(up[0], 0.0, 1e-6);
        assert_close(up[1], 0.0, 1e-6);
        assert_close(up[2], 1.0, 1e-6);

        for (actual, expected) in r.as_array().iter().zip(RotationMatrix::IDENTITY.as_array()) {
            assert_close(*actual, *expected, 1e-6);
        }
    }

    #[test]
    fn test_inclination_matrix_matches_field_dip() {
        let a = Vector3::new(0.0, 0.0, 9.81);
        let m = Vector3::new(0.0, 16.0, -30.0);
        let (_, i) = compute_rotation_and_inclination(&a, &m).unwrap();

        // |E| = 34, c = 16/34, s = -30/34
        assert_close(i.0[4], 16.0 / 34.0, 1e-6);
        assert_close(i.0[5], -30.0 / 34.0, 1e-6);
        assert_close(i.0[7], 30.0 / 34.0, 1e-6);
        assert_close(i.0[8], 16.0 / 34.0, 1e-6);
        assert_eq!(i.0[0], 1.0);
    }

    #[test]
    fn test_tilted_input_is_orthonormal() {
        let a = Vector3::new(1.3, -4.2, 8.6);
        let m = Vector3::new(12.0, 21.0, -38.0);
        let (r, _) = compute_rotation_and_inclination(&a, &m).unwrap();

        assert!(r.orthonormality_error() < 1e-5);
        assert_close(r.determinant(), 1.0, 1e-5);

        let a_norm = a.norm();
        let up = r.row(2);
        assert_close(up[0], a.x / a_norm, 1e-6);
        assert_close(up[1], a.y / a_norm, 1e-6);
        assert_close(up[2], a.z / a_norm, 1e-6);
    }

    #[test]
    fn test_collinear_vectors_are_rejected() {
        let v = Vector3::new(0.0, 0.0, 1.0);
        let result = compute_rotation_and_inclination(&v, &v);
        assert!(matches!(result, Err(LevelError::DegenerateInput(_))));

        let a = Vector3::new(0.0, 0.0, 9.81);
        let m = Vector3::new(0.0, 0.0, -40.0);
        assert!(matches!(
            compute_rotation_and_inclination(&a, &m),
            Err(LevelError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_zero_vectors_are_rejected() {
        let zero = Vector3::default();
        let a = Vector3::new(0.0, 0.0, 9.81);
        let m = Vector3::new(0.0, 16.0, -30.0);

        assert!(compute_rotation_and_inclination(&zero, &m).is_err());
        assert!(compute_rotation_and_inclination(&a, &zero).is_err());
    }

    #[test]
    fn test_free_fall_is_rejected() {
        let a = Vector3::new(0.0, 0.5, 0.5);
        let m = Vector3::new(0.0, 16.0, -30.0);
        let err = compute_rotation_and_inclination(&a, &m).unwrap_err();
        assert!(err.is_degenerate());
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let a = Vector3::new(f32::NAN, 0.0, 9.81);
        let m = Vector3::new(0.0, 16.0, -30.0);
        assert!(compute_rotation_and_inclination(&a, &m)
            .unwrap_err()
            .is_degenerate());
    }

    #[test]
    fn test_overflowing_magnitudes_are_rejected() {
        // Finite components whose squared norm overflows f32.
        let a = Vector3::new(0.0, 0.0, 1e20);
        let m = Vector3::new(0.0, 1e20, 0.0);
        assert!(compute_rotation_and_inclination(&a, &m)
            .unwrap_err()
            .is_degenerate());

        // Norms fit, the cross product does not.
        let a = Vector3::new(0.0, 0.0, 1e15);
        let m = Vector3::new(0.0, 1e18, 0.0);
        assert!(compute_rotation_and_inclination(&a, &m)
            .unwrap_err()
            .is_degenerate());
    }
}
