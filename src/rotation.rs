use nalgebra as na;

/// Tolerance for the orthonormality diagnostic on rotation inputs.
pub const ORTHONORMAL_TOL: f32 = 1e-3;

/// Converts a row-major 3x3 rotation matrix to a unit quaternion.
///
/// Shepperd's method: branch on the largest of the trace and the three
/// diagonal elements so the square root argument stays well away from zero.
/// The naive trace-only formula is singular at 180-degree rotations; this
/// one is stable at all angles. The result is renormalized to absorb
/// floating-point drift in the input.
pub fn quaternion_from_matrix(m: &na::Matrix3<f32>) -> na::UnitQuaternion<f32> {
    let trace = m[(0, 0)] + m[(1, 1)] + m[(2, 2)];

    // nalgebra quaternions are (w, x, y, z) constructor order
    let q = if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        na::Quaternion::new(
            0.25 * s,
            (m[(2, 1)] - m[(1, 2)]) / s,
            (m[(0, 2)] - m[(2, 0)]) / s,
            (m[(1, 0)] - m[(0, 1)]) / s,
        )
    } else if m[(0, 0)] > m[(1, 1)] && m[(0, 0)] > m[(2, 2)] {
        let s = (1.0 + m[(0, 0)] - m[(1, 1)] - m[(2, 2)]).sqrt() * 2.0;
        na::Quaternion::new(
            (m[(2, 1)] - m[(1, 2)]) / s,
            0.25 * s,
            (m[(0, 1)] + m[(1, 0)]) / s,
            (m[(0, 2)] + m[(2, 0)]) / s,
        )
    } else if m[(1, 1)] > m[(2, 2)] {
        let s = (1.0 + m[(1, 1)] - m[(0, 0)] - m[(2, 2)]).sqrt() * 2.0;
        na::Quaternion::new(
            (m[(0, 2)] - m[(2, 0)]) / s,
            (m[(0, 1)] + m[(1, 0)]) / s,
            0.25 * s,
            (m[(1, 2)] + m[(2, 1)]) / s,
        )
    } else {
        let s = (1.0 + m[(2, 2)] - m[(0, 0)] - m[(1, 1)]).sqrt() * 2.0;
        na::Quaternion::new(
            (m[(1, 0)] - m[(0, 1)]) / s,
            (m[(0, 2)] + m[(2, 0)]) / s,
            (m[(1, 2)] + m[(2, 1)]) / s,
            0.25 * s,
        )
    };

    na::UnitQuaternion::new_normalize(q)
}

/// Checks that `m` is a proper rotation: `m * mᵀ ≈ I` and `det(m) ≈ 1`.
pub fn is_orthonormal(m: &na::Matrix3<f32>, tol: f32) -> bool {
    let gram = m * m.transpose();
    (gram - na::Matrix3::identity()).abs().max() <= tol && (m.determinant() - 1.0).abs() <= tol
}
