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

use nalgebra::{Matrix3, Point3, RealField, Vector3};

use crate::reductions::pairwise_sum;

/// The accumulated cross-covariance between a source and target deviation
/// set, plus the two scale scalars used to recover the similarity scale
/// factor.
///
/// Named `sc_num`/`sc_den` to match the eleven-float wire layout
/// `(s11..s33, Sc_num, Sc_den)`: the trailing two scalars are dot products of
/// the *original, non-centred* landmarks, not of their deviations.
#[derive(Clone, Copy, Debug)]
pub struct SMatrix<T> {
    /// `sum(w_i * dev_target_i * dev_source_i^T)`.
    pub cross_covariance: Matrix3<T>,
    /// `sum(w_i * (target_i . source_i))`, over the original (non-centred) landmarks.
    pub sc_num: T,
    /// `sum(w_i * (source_i . source_i))`, over the original (non-centred) landmarks.
    pub sc_den: T,
}

fn outer_product<T: RealField + Copy>(a: &Vector3<T>, b: &Vector3<T>) -> Matrix3<T> {
    a * b.transpose()
}

/// Accumulates the weighted cross-covariance matrix and scale scalars.
///
/// # Arguments
/// * `source_deviations`, `target_deviations`: deviations from
///   [`super::deviations::deviations_from_centroid`], one per correspondence,
///   used for the 3x3 cross-covariance block.
/// * `source_points`, `target_points`: the original, non-centred
///   correspondence endpoints, used for `sc_num`/`sc_den`.
/// * `weights`: one weight per correspondence, from [`super::weights::compute_weights`].
///
/// All slices must be the same length; correspondences beyond the shortest
/// are ignored.
pub fn accumulate_smatrix<T: RealField + Copy + Send + Sync>(
    source_deviations: &[Vector3<T>],
    target_deviations: &[Vector3<T>],
    source_points: &[Point3<T>],
    target_points: &[Point3<T>],
    weights: &[T],
) -> SMatrix<T> {
    let cross_covariances: crate::Vec<Matrix3<T>> = source_deviations
        .iter()
        .zip(target_deviations.iter())
        .zip(weights.iter())
        .map(|((source_dev, target_dev), &weight)| outer_product(target_dev, source_dev) * weight)
        .collect();

    let scale_terms: crate::Vec<(T, T)> = source_points
        .iter()
        .zip(target_points.iter())
        .zip(weights.iter())
        .map(|((source_point, target_point), &weight)| {
            (
                weight * target_point.coords.dot(&source_point.coords),
                weight * source_point.coords.dot(&source_point.coords),
            )
        })
        .collect();
    let sc_nums: crate::Vec<T> = scale_terms.iter().map(|(n, _)| *n).collect();
    let sc_dens: crate::Vec<T> = scale_terms.iter().map(|(_, d)| *d).collect();

    SMatrix {
        cross_covariance: pairwise_sum(&cross_covariances, Matrix3::zeros()),
        sc_num: pairwise_sum(&sc_nums, T::zero()),
        sc_den: pairwise_sum(&sc_dens, T::zero()),
    }
}
