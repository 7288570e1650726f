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

//! The photogeometric ICP inner loop: one call to [`icp_iteration`] samples
//! landmarks, builds a Random Ball Cover over the target, finds
//! correspondences, weighs them, accumulates the S-matrix, extracts a
//! rotation, and recovers translation and scale. Driving repeated calls to
//! convergence is `photoicp-suites`'s job.

pub mod config;
pub mod deviations;
pub mod error;
pub mod means;
pub mod rotation;
pub mod smatrix;
pub mod transform;
pub mod weights;

pub use config::{IcpConfig, IcpConfigBuilder};
pub use error::{IcpError, IcpResult, Stage};
pub use transform::TransformRecord;

use nalgebra::{Point3, RealField};

use crate::{
    point_clouds::{colour, geometry_homogeneous, sample_stride, Point8},
    rbc::{NearestNeighbourIndex, RandomBallCover},
    reductions::pairwise_sum,
    types::RotationMethod,
    Vec,
};

/// The result of one inner-loop iteration: the transform accumulated so far
/// (composed with the caller's previous estimate) and the resulting mean
/// squared error over this iteration's correspondences.
#[derive(Clone, Copy, Debug)]
pub struct IterationOutcome<T> {
    /// The updated cumulative transform.
    pub transform: TransformRecord<T>,
    /// This iteration's own delta, `T_k`, before composing onto
    /// `current_transform`. The outer loop's convergence test is defined
    /// over this delta, not the cumulative transform.
    pub step: TransformRecord<T>,
    /// The mean squared geometric error over this iteration's correspondences.
    pub mse: T,
    /// The number of correspondences the iteration found.
    pub correspondence_count: usize,
    /// `true` if the S-matrix was rank-deficient this iteration, in which
    /// case `step` is the identity transform rather than a genuine estimate.
    pub degenerate: bool,
}

fn photogeometric_vec4<T: RealField + Copy>(point: &Point8<T>, colour_weight: T) -> nalgebra::Point<T, 4> {
    let geometry = geometry_homogeneous(point);
    let c = crate::point_clouds::distance::colour_scalar(point, colour_weight);
    nalgebra::Point::from([geometry[0], geometry[1], geometry[2], c])
}

fn geometry3<T: RealField + Copy>(point: &Point8<T>) -> Point3<T> {
    Point3::new(point[0], point[1], point[2])
}

/// Runs one photogeometric ICP inner-loop iteration.
///
/// # Arguments
/// * `source`: the moving frame's photogeometric point cloud.
/// * `target`: the reference frame's photogeometric point cloud.
/// * `current_transform`: the transform estimated by previous iterations
///   (use [`TransformRecord::identity`] for the first call).
/// * `config`: tuning parameters for sampling, weighting, rotation
///   extraction and transform application.
///
/// # Returns
/// An [`IterationOutcome`] with the updated cumulative transform and this
/// iteration's MSE, or an [`IcpError`] naming the stage that could not
/// produce a result (typically because every correspondence was filtered
/// out, or because one of the clouds was empty).
#[cfg_attr(feature = "tracing", tracing::instrument("ICP Iteration", skip_all))]
pub fn icp_iteration<T: RealField + Copy + Send + Sync>(
    source: &[Point8<T>],
    target: &[Point8<T>],
    current_transform: &TransformRecord<T>,
    config: &IcpConfig<T>,
) -> IcpResult<T, IterationOutcome<T>> {
    if source.is_empty() || target.is_empty() {
        return Err(IcpError::EmptyPointCloud);
    }

    let source_indices = sample_stride(source.len(), config.num_landmarks());
    if source_indices.is_empty() {
        return Err(IcpError::ComputeFailed {
            stage: Stage::Sampling,
        });
    }

    let target_indices = sample_stride(target.len(), config.num_landmarks());
    if target_indices.is_empty() {
        return Err(IcpError::ComputeFailed {
            stage: Stage::Sampling,
        });
    }
    let target_vec4: Vec<nalgebra::Point<T, 4>> = target_indices
        .iter()
        .map(|&idx| photogeometric_vec4(&target[idx], config.colour_weight()))
        .collect();
    let target_representatives = sample_stride(target_vec4.len(), config.num_representatives());
    if target_representatives.is_empty() {
        return Err(IcpError::ComputeFailed { stage: Stage::Rbc });
    }
    let rbc = RandomBallCover::build(&target_vec4, &target_representatives, config.use_kd_tree());

    let mut source_geometry = Vec::with_capacity(source_indices.len());
    let mut target_geometry = Vec::with_capacity(source_indices.len());
    let mut distances_squared = Vec::with_capacity(source_indices.len());

    for &idx in source_indices.iter() {
        let transformed_point = current_transform.apply_point_quaternion(&geometry3(&source[idx]));
        let transformed_colour_point = colour(&source[idx]);
        let query = nalgebra::Point::from([
            transformed_point.x,
            transformed_point.y,
            transformed_point.z,
            crate::point_clouds::distance::colour_scalar(
                &crate::point_clouds::from_geometry_colour(
                    [transformed_point.x, transformed_point.y, transformed_point.z],
                    [transformed_colour_point[0], transformed_colour_point[1], transformed_colour_point[2]],
                ),
                config.colour_weight(),
            ),
        ]);

        if let Some((target_idx, nearest)) = rbc.nearest(&query) {
            // `query` and `nearest` are the same 4-vectors the RBC matched
            // on; using them directly (rather than reconstructing 8-D points)
            // avoids re-deriving a colour the RBC has already folded in, and
            // keeps this weighting distance consistent with what the RBC
            // itself compared.
            let dx = query[0] - nearest[0];
            let dy = query[1] - nearest[1];
            let dz = query[2] - nearest[2];
            let dc = query[3] - nearest[3];
            let distance_squared = dx * dx + dy * dy + dz * dz + dc * dc;
            source_geometry.push(transformed_point);
            target_geometry.push(geometry3(&target[target_indices[target_idx]]));
            distances_squared.push(distance_squared);
        }
    }

    if source_geometry.is_empty() {
        return Err(IcpError::ComputeFailed {
            stage: Stage::Weights,
        });
    }

    let weight_eps = T::default_epsilon();
    let weights = weights::compute_weights(&distances_squared, config.weighting_mode(), weight_eps);

    let mean_source = means::weighted_centroid(&source_geometry, &weights);
    let mean_target = means::weighted_centroid(&target_geometry, &weights);

    let source_deviations = deviations::deviations_from_centroid(&source_geometry, &mean_source);
    let target_deviations = deviations::deviations_from_centroid(&target_geometry, &mean_target);

    let s_matrix = smatrix::accumulate_smatrix(
        &source_deviations,
        &target_deviations,
        &source_geometry,
        &target_geometry,
        &weights,
    );

    let (rotation, degenerate) = match config.rotation_method() {
        RotationMethod::Svd => {
            let rotation = rotation::svd_rotation(s_matrix.cross_covariance).ok_or(
                IcpError::ComputeFailed {
                    stage: Stage::Rotation,
                },
            )?;
            (rotation, rotation::is_rank_deficient(s_matrix.cross_covariance))
        }
        RotationMethod::PowerMethod => {
            let outcome = rotation::power_method_rotation(s_matrix.cross_covariance, 200);
            (
                outcome.rotation,
                outcome.degenerate || rotation::is_rank_deficient(s_matrix.cross_covariance),
            )
        }
    };

    let iteration_transform = if degenerate {
        TransformRecord::identity()
    } else {
        TransformRecord::from_rotation_and_centroids(
            rotation,
            mean_source,
            mean_target,
            s_matrix.sc_num,
            s_matrix.sc_den,
            config.scale_damping(),
            config.scale_locked(),
        )
    };

    let updated_transform = iteration_transform.compose(current_transform);

    let squared_errors: Vec<T> = source_geometry
        .iter()
        .zip(target_geometry.iter())
        .map(|(source_point, target_point)| {
            let transformed = iteration_transform.apply_point_quaternion(source_point);
            (transformed - target_point).norm_squared()
        })
        .collect();
    let count = squared_errors.len();
    let mse = pairwise_sum(&squared_errors, T::zero()) / nalgebra::convert(count as f64);
    log::trace!("New MSE: {mse}");

    Ok(IterationOutcome {
        transform: updated_transform,
        step: iteration_transform,
        mse,
        correspondence_count: count,
        degenerate,
    })
}

#[cfg(feature = "pregenerated")]
#[doc = "Pregenerated, precision-specific entry points, avoiding a generic-to-monomorphic jump at call sites that need a stable ABI."]
pub mod pregenerated {
    use super::{icp_iteration, IcpConfig, IcpResult, IterationOutcome, TransformRecord};
    use crate::point_clouds::Point8;

    macro_rules! impl_pregenerated_iteration {
        ($precision:ty) => {
            paste::paste! {
                #[doc = "Runs one " $precision " photogeometric ICP iteration."]
                pub fn [<icp_iteration_ $precision>](
                    source: &[Point8<$precision>],
                    target: &[Point8<$precision>],
                    current_transform: &TransformRecord<$precision>,
                    config: &IcpConfig<$precision>,
                ) -> IcpResult<$precision, IterationOutcome<$precision>> {
                    icp_iteration(source, target, current_transform, config)
                }
            }
        };
    }

    impl_pregenerated_iteration!(f32);
    impl_pregenerated_iteration!(f64);
}
