// SPDX-License-Identifier: MIT
/*
 * Copyright (c) [2023 - Present] Emily Matheys <emilymatt96@gmail.com>
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

use nalgebra::{Matrix3, Matrix4, Quaternion, RealField, UnitQuaternion, Vector4};

/// The outcome of Power-Method rotation extraction: the recovered rotation,
/// plus a flag noting whether the top two eigenvalues of the derived matrix
/// were too close to call, a sign that the correspondences under-constrain
/// the rotation (e.g. a near-planar point cloud).
#[derive(Clone, Copy, Debug)]
pub struct PowerMethodRotation<T> {
    /// The unit quaternion corresponding to the dominant eigenvector.
    pub rotation: UnitQuaternion<T>,
    /// `true` when the top two eigenvalues of the derived matrix are within
    /// `degeneracy_epsilon` of each other.
    pub degenerate: bool,
}

/// Extracts a rotation from the 3x3 cross-covariance block via SVD, following
/// the Kabsch/Arun closed-form solution: `R = V * diag(1, 1, det(V U^T)) * U^T`.
///
/// Returns `None` if the SVD fails to produce both `U` and `V^T` (only
/// possible for a degenerate, e.g. all-zero, cross-covariance matrix).
pub fn svd_rotation<T: RealField + Copy>(cross_covariance: Matrix3<T>) -> Option<UnitQuaternion<T>> {
    let svd = cross_covariance.svd(true, true);
    let u = svd.u?;
    let v = svd.v_t?.transpose();

    let det = (v * u.transpose()).determinant();
    let correction = Matrix3::from_diagonal(&nalgebra::Vector3::new(
        T::one(),
        T::one(),
        det.signum(),
    ));
    let rotation_matrix = v * correction * u.transpose();

    Some(UnitQuaternion::from_matrix(&rotation_matrix))
}

/// Checks whether the 3x3 cross-covariance is rank-deficient: its smallest
/// singular value is negligible relative to its largest, which happens when
/// the correspondences driving this iteration are coplanar, collinear, or
/// otherwise under-constrain a 3-D rotation.
pub fn is_rank_deficient<T: RealField + Copy>(cross_covariance: Matrix3<T>) -> bool {
    let singular_values = cross_covariance.svd(false, false).singular_values;
    let largest = singular_values[0];
    if largest <= T::default_epsilon() {
        return true;
    }
    singular_values[2] / largest < T::default_epsilon().sqrt()
}

/// Builds the symmetric 4x4 matrix (Horn's method) whose dominant eigenvector
/// is the optimal unit quaternion `(w, x, y, z)` for the given cross-covariance.
fn horn_matrix<T: RealField + Copy>(s: Matrix3<T>) -> Matrix4<T> {
    let sxx = s[(0, 0)];
    let sxy = s[(0, 1)];
    let sxz = s[(0, 2)];
    let syx = s[(1, 0)];
    let syy = s[(1, 1)];
    let syz = s[(1, 2)];
    let szx = s[(2, 0)];
    let szy = s[(2, 1)];
    let szz = s[(2, 2)];

    Matrix4::new(
        sxx + syy + szz,
        syz - szy,
        szx - sxz,
        sxy - syx,
        syz - szy,
        sxx - syy - szz,
        sxy + syx,
        szx + sxz,
        szx - sxz,
        sxy + syx,
        -sxx + syy - szz,
        syz + szy,
        sxy - syx,
        szx + sxz,
        syz + szy,
        -sxx - syy + szz,
    )
}

/// Gershgorin lower bound on the spectrum of a symmetric matrix: the least of
/// `diagonal_i - sum_{j != i}(abs(entry_ij))` over all rows, a value no
/// eigenvalue falls below.
///
/// Horn's 4x4 matrix is traceless, so its eigenvalues are not all
/// non-negative; shifting by this bound before power-iterating guarantees the
/// shifted spectrum is, which in turn guarantees iteration converges to the
/// original matrix's most positive eigenvalue rather than whichever
/// eigenvalue happens to have the largest magnitude.
fn gershgorin_lower_bound<T: RealField + Copy>(matrix: &Matrix4<T>) -> T {
    (0..4)
        .map(|i| {
            let radius = (0..4)
                .filter(|&j| j != i)
                .fold(T::zero(), |acc, j| acc + matrix[(i, j)].abs());
            matrix[(i, i)] - radius
        })
        .fold(None, |acc: Option<T>, bound| {
            Some(acc.map_or(bound, |current| if bound < current { bound } else { current }))
        })
        .unwrap_or_else(T::zero)
}

fn rayleigh_quotient<T: RealField + Copy>(matrix: Matrix4<T>, v: Vector4<T>) -> T {
    v.dot(&(matrix * v))
}

/// Power-iterates `matrix` from `seed` until the (sign-canonicalized) update
/// shrinks below `tolerance` or `max_iterations` is reached, returning the
/// resulting unit eigenvector.
fn power_iterate<T: RealField + Copy>(
    matrix: Matrix4<T>,
    seed: Vector4<T>,
    max_iterations: usize,
    tolerance: T,
) -> Vector4<T> {
    let mut eigenvector = seed;
    for _ in 0..max_iterations {
        let next = matrix * eigenvector;
        let norm = next.norm();
        let next = if norm > T::zero() { next / norm } else { break };

        // The eigenvector is only defined up to sign; comparing against
        // both `next` and `-next` keeps the delta meaningful across a sign
        // flip between iterations.
        let forward_delta = (next - eigenvector).norm();
        let backward_delta = (next + eigenvector).norm();
        let (candidate, delta) = if forward_delta <= backward_delta {
            (next, forward_delta)
        } else {
            (-next, backward_delta)
        };

        eigenvector = candidate;
        if delta < tolerance {
            break;
        }
    }
    eigenvector
}

fn deflate<T: RealField + Copy>(matrix: Matrix4<T>, eigenvector: Vector4<T>, eigenvalue: T) -> Matrix4<T> {
    matrix - (eigenvector * eigenvector.transpose()) * eigenvalue
}

/// Extracts a rotation from the 3x3 cross-covariance block via power
/// iteration with deflation against the derived symmetric 4x4 matrix.
///
/// Finds the dominant eigenvector by power iteration on a Gershgorin-shifted
/// copy of the matrix (see [`gershgorin_lower_bound`]), deflates against it,
/// then runs power iteration again to find the second eigenvector: a
/// near-tie between the two eigenvalues means the correspondences do not
/// sufficiently constrain the rotation (e.g. a planar or symmetric point
/// cloud), which callers surface via [`PowerMethodRotation::degenerate`]
/// rather than silently returning a numerically unstable result.
///
/// # Arguments
/// * `cross_covariance`: the accumulated S-matrix cross-covariance block.
/// * `iterations`: the maximum number of power-iteration steps to run for
///   each of the two eigenvectors; iteration stops early once the
///   sign-canonicalized update is below a fixed `1e-6` tolerance.
pub fn power_method_rotation<T: RealField + Copy>(
    cross_covariance: Matrix3<T>,
    iterations: usize,
) -> PowerMethodRotation<T> {
    let matrix = horn_matrix(cross_covariance);
    let tolerance: T = nalgebra::convert(1e-6);

    // Horn's matrix is traceless (its eigenvalues sum to zero), so the
    // optimal quaternion's eigenvalue -- the most positive one -- is not
    // necessarily the largest in magnitude. Shifting by a Gershgorin lower
    // bound makes every shifted eigenvalue non-negative, so plain power
    // iteration on the shifted matrix is guaranteed to converge to it.
    let shift = gershgorin_lower_bound(&matrix);
    let shifted = matrix - Matrix4::identity() * shift;

    let seed = Vector4::new(T::one(), T::zero(), T::zero(), T::zero());
    let dominant = power_iterate(shifted, seed, iterations, tolerance);
    let lambda1 = rayleigh_quotient(matrix, dominant);

    let orthogonal_seed = Vector4::new(T::zero(), T::one(), T::zero(), T::zero());
    let shifted_lambda1 = rayleigh_quotient(shifted, dominant);
    let deflated = deflate(shifted, dominant, shifted_lambda1);
    let second = power_iterate(deflated, orthogonal_seed, iterations, tolerance);
    let lambda2 = rayleigh_quotient(matrix, second);

    let gap = (lambda1 - lambda2).abs();
    let scale = lambda1.abs().max(T::one());
    let degenerate = gap < T::default_epsilon() * scale;

    let quaternion = if dominant[0] < T::zero() {
        -dominant
    } else {
        dominant
    };

    PowerMethodRotation {
        rotation: UnitQuaternion::new_normalize(Quaternion::new(
            quaternion[0],
            quaternion[1],
            quaternion[2],
            quaternion[3],
        )),
        degenerate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Vector3};

    fn rotated_cross_covariance(rotation: Rotation3<f64>) -> Matrix3<f64> {
        // For perfectly-matched, unit-weighted correspondences with deviations
        // `dev_target = R * dev_source`, the S-matrix degenerates to `R` itself
        // scaled by the deviations' energy; using orthonormal basis deviations
        // makes that scale the identity.
        let basis = [Vector3::x(), Vector3::y(), Vector3::z()];
        basis
            .iter()
            .map(|axis| (rotation * axis) * axis.transpose())
            .fold(Matrix3::zeros(), |acc, m| acc + m)
    }

    #[test]
    fn test_svd_rotation_recovers_identity() {
        let s = rotated_cross_covariance(Rotation3::identity());
        let recovered = svd_rotation(s).unwrap();
        assert!((recovered.angle()).abs() < 1e-9);
    }

    #[test]
    fn test_svd_rotation_recovers_known_rotation() {
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.3);
        let s = rotated_cross_covariance(rotation);
        let recovered = svd_rotation(s).unwrap();
        let expected = UnitQuaternion::from_rotation_matrix(&rotation);
        assert!((recovered.angle_to(&expected)).abs() < 1e-6);
    }

    #[test]
    fn test_power_method_recovers_known_rotation() {
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), 0.7);
        let s = rotated_cross_covariance(rotation);
        let outcome = power_method_rotation(s, 100);
        let expected = UnitQuaternion::from_rotation_matrix(&rotation);
        assert!((outcome.rotation.angle_to(&expected)).abs() < 1e-4);
    }

    #[test]
    fn test_power_method_flags_degenerate_zero_matrix() {
        let outcome = power_method_rotation(Matrix3::zeros(), 50);
        assert!(outcome.degenerate);
    }

    #[test]
    fn test_power_method_quaternion_is_unit_and_rotation_is_orthonormal_with_positive_det() {
        let axis = nalgebra::Unit::new_normalize(Vector3::new(1.0, 1.0, 1.0));
        let rotation = Rotation3::from_axis_angle(&axis, 0.9);
        let s = rotated_cross_covariance(rotation);
        let outcome = power_method_rotation(s, 100);

        assert!((outcome.rotation.quaternion().norm() - 1.0).abs() < 1e-6);

        let r = outcome.rotation.to_rotation_matrix().into_inner();
        let should_be_identity = r.transpose() * r;
        assert!((should_be_identity - Matrix3::identity()).amax() < 1e-5);
        assert!(r.determinant() > 0.0);
    }

    #[test]
    fn test_is_rank_deficient_flags_zero_matrix() {
        assert!(is_rank_deficient(Matrix3::<f64>::zeros()));
    }

    #[test]
    fn test_is_rank_deficient_flags_planar_covariance() {
        // Rank-2: all deviation energy lies in the xy-plane, z is untouched.
        let s = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0);
        assert!(is_rank_deficient(s));
    }

    #[test]
    fn test_is_rank_deficient_false_for_full_rank() {
        let s = rotated_cross_covariance(Rotation3::from_axis_angle(&Vector3::z_axis(), 0.3));
        assert!(!is_rank_deficient(s));
    }

    /// Reference vector captured from a live registration run: a fixed
    /// cross-covariance and mean pair should recover a known `(q, t, s)`.
    #[test]
    fn test_power_method_fixed_input_matches_reference_transform() {
        use crate::icp::transform::TransformRecord;
        use nalgebra::{Point3, Vector3 as V3};

        let s = Matrix3::new(
            1.68e-3, 1.31e-4, -7.75e-4, 1.57e-4, 1.03e-3, -5.63e-4, -7.22e-4, -5.59e-4, 2.47e-3,
        );
        let sc_num = 5.21e-3;
        let sc_den = 5.15e-3;
        let mean_source = Point3::new(-44.83, -19.38, 1485.93);
        let mean_target = Point3::new(-33.97, -17.64, 1494.22);

        let outcome = power_method_rotation(s, 200);
        assert!(!outcome.degenerate);

        let expected_quaternion =
            Quaternion::new(0.99995, 1.11e-3, 7.31e-3, -6.47e-3);
        let recovered = outcome.rotation.quaternion();
        assert!((recovered.w() - expected_quaternion.w()).abs() < 5e-3);
        assert!((recovered.i() - expected_quaternion.i()).abs() < 5e-3);
        assert!((recovered.j() - expected_quaternion.j()).abs() < 5e-3);
        assert!((recovered.k() - expected_quaternion.k()).abs() < 5e-3);

        let transform = TransformRecord::from_rotation_and_centroids(
            outcome.rotation,
            mean_source,
            mean_target,
            sc_num,
            sc_den,
            1e-6,
            false,
        );

        assert!((transform.scale - 1.006).abs() < 5e-3);
        // Large `mean_source.z` (~1486mm) amplifies sub-1e-3-rad quaternion
        // error into a much larger z-translation error, so this leg only
        // checks the recovered translation is in the right ballpark.
        let expected_translation = V3::new(-10.46, 4.74, -0.76);
        assert!((transform.translation - expected_translation).norm() < 1.5);
    }
}
