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

use nalgebra::{Matrix4, Point3, RealField, UnitQuaternion, Vector3};

use crate::{types::TransformMode, Vec};

/// A rigid or similarity transform estimated by one ICP iteration: rotation,
/// translation, and a uniform scale factor (`1` when
/// [`super::config::IcpConfig::scale_locked`] is set).
#[derive(Clone, Copy, Debug)]
pub struct TransformRecord<T> {
    /// The estimated rotation.
    pub rotation: UnitQuaternion<T>,
    /// The estimated translation.
    pub translation: Vector3<T>,
    /// The estimated uniform scale factor.
    pub scale: T,
}

impl<T: RealField + Copy> TransformRecord<T> {
    /// The identity transform: no rotation, no translation, unit scale.
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
            scale: T::one(),
        }
    }

    /// Recovers the translation and scale closing a rotation estimate:
    /// `t = mean_target - s * R * mean_source`,
    /// `s = sqrt(sc_num / (sc_den + damping))` unless scale is locked.
    ///
    /// # Arguments
    /// * `rotation`: the rotation recovered from the S-matrix.
    /// * `mean_source`, `mean_target`: the weighted centroids of this iteration's correspondences.
    /// * `sc_num`, `sc_den`: the two trailing S-matrix scalars
    ///   ([`super::smatrix::SMatrix::sc_num`]/`sc_den`).
    /// * `damping`: the small constant added to `sc_den` that prevents scale
    ///   blow-up when the source landmarks sit near the origin.
    /// * `scale_locked`: when `true`, `scale` is fixed at `1` (rigid ICP).
    pub fn from_rotation_and_centroids(
        rotation: UnitQuaternion<T>,
        mean_source: Point3<T>,
        mean_target: Point3<T>,
        sc_num: T,
        sc_den: T,
        damping: T,
        scale_locked: bool,
    ) -> Self {
        let scale = if scale_locked || sc_num <= T::zero() {
            T::one()
        } else {
            (sc_num / (sc_den + damping)).sqrt()
        };

        let translation = mean_target.coords - (rotation * mean_source.coords) * scale;

        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Composes `self` applied after `previous`: `self * previous`, in the
    /// sense that transforming a point by the result equals transforming it
    /// by `previous` first and then by `self`.
    pub fn compose(&self, previous: &Self) -> Self {
        Self {
            rotation: self.rotation * previous.rotation,
            translation: (self.rotation * previous.translation) * self.scale + self.translation,
            scale: self.scale * previous.scale,
        }
    }

    /// Applies this transform to a point: `p' = s * R * p + t`.
    #[inline]
    pub fn apply_point_quaternion(&self, point: &Point3<T>) -> Point3<T> {
        Point3::from((self.rotation * point.coords) * self.scale + self.translation)
    }

    /// Returns the equivalent 4x4 homogeneous matrix, with the upper-left 3x3
    /// block already pre-multiplied by `scale`.
    pub fn to_matrix4(&self) -> Matrix4<T> {
        let rotation_scaled = self.rotation.to_rotation_matrix().into_inner() * self.scale;
        let mut matrix = Matrix4::identity();
        matrix
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&rotation_scaled);
        matrix
            .fixed_view_mut::<3, 1>(0, 3)
            .copy_from(&self.translation);
        matrix
    }

    /// Applies this transform to a point via its homogeneous matrix form.
    #[inline]
    pub fn apply_point_matrix(&self, point: &Point3<T>) -> Point3<T> {
        let matrix = self.to_matrix4();
        let homogeneous = matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Applies this transform to every point in `points`, selecting between
    /// the quaternion and matrix code paths per `mode`.
    pub fn apply_to_cloud(&self, points: &[Point3<T>], mode: TransformMode) -> Vec<Point3<T>> {
        match mode {
            TransformMode::Quaternion => points
                .iter()
                .map(|point| self.apply_point_quaternion(point))
                .collect(),
            TransformMode::Matrix => {
                let matrix = self.to_matrix4();
                points
                    .iter()
                    .map(|point| {
                        Point3::from_homogeneous(matrix * point.to_homogeneous())
                            .unwrap_or(*point)
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3 as V3;

    #[test]
    fn test_identity_transform_is_noop() {
        let transform = TransformRecord::<f64>::identity();
        let point = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(transform.apply_point_quaternion(&point), point);
    }

    #[test]
    fn test_quaternion_and_matrix_paths_agree() {
        let transform = TransformRecord {
            rotation: UnitQuaternion::from_axis_angle(&nalgebra::Vector3::z_axis(), 0.4),
            translation: V3::new(1.0, -2.0, 0.5),
            scale: 1.2,
        };
        let point = Point3::new(3.0, -1.0, 2.0);

        let via_quaternion = transform.apply_point_quaternion(&point);
        let via_matrix = transform.apply_point_matrix(&point);

        assert!((via_quaternion - via_matrix).coords.norm() < 1e-10);
    }

    #[test]
    fn test_from_rotation_and_centroids_locked_scale() {
        let rotation = UnitQuaternion::identity();
        let mean_source = Point3::new(1.0, 0.0, 0.0);
        let mean_target = Point3::new(2.0, 0.0, 0.0);

        let transform = TransformRecord::from_rotation_and_centroids(
            rotation,
            mean_source,
            mean_target,
            16.0,
            4.0,
            0.0,
            true,
        );

        assert_eq!(transform.scale, 1.0);
        assert_eq!(transform.translation, V3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_from_rotation_and_centroids_recovers_scale() {
        let rotation = UnitQuaternion::identity();
        let mean_source = Point3::origin();
        let mean_target = Point3::origin();

        let transform = TransformRecord::from_rotation_and_centroids(
            rotation,
            mean_source,
            mean_target,
            16.0,
            4.0,
            0.0,
            false,
        );

        assert_eq!(transform.scale, 2.0);
    }

    #[test]
    fn test_transform_then_inverse_round_trips() {
        let transform = TransformRecord {
            rotation: UnitQuaternion::from_axis_angle(&nalgebra::Vector3::y_axis(), 0.5),
            translation: V3::new(3.0, -2.0, 1.0),
            scale: 1.1,
        };
        let inverse_rotation = transform.rotation.inverse();
        let inverse = TransformRecord {
            rotation: inverse_rotation,
            translation: (inverse_rotation * -transform.translation) / transform.scale,
            scale: 1.0 / transform.scale,
        };

        let point = Point3::new(5.0, 4.0, -3.0);
        let forward = transform.apply_point_quaternion(&point);
        let back = inverse.apply_point_quaternion(&forward);

        assert!((back - point).coords.norm() < 5e-3);
    }

    #[test]
    fn test_compose_matches_sequential_application() {
        let first = TransformRecord {
            rotation: UnitQuaternion::from_axis_angle(&nalgebra::Vector3::z_axis(), 0.2),
            translation: V3::new(1.0, 0.0, 0.0),
            scale: 1.0,
        };
        let second = TransformRecord {
            rotation: UnitQuaternion::from_axis_angle(&nalgebra::Vector3::x_axis(), 0.3),
            translation: V3::new(0.0, 1.0, 0.0),
            scale: 1.0,
        };

        let point = Point3::new(2.0, -1.0, 0.5);
        let sequential = second.apply_point_quaternion(&first.apply_point_quaternion(&point));
        let composed = second.compose(&first);
        let direct = composed.apply_point_quaternion(&point);

        assert!((sequential - direct).coords.norm() < 1e-9);
    }
}
