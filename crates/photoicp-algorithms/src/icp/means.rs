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

use nalgebra::{Point3, RealField};

use crate::reductions::pairwise_sum;

/// Computes the weighted centroid of a set of 3-D points.
///
/// Uses [`pairwise_sum`] rather than a left-to-right fold so the result does
/// not depend on whether the caller accumulated `points`/`weights` serially
/// or assembled them from parallel chunks.
///
/// # Arguments
/// * `points`: the geometric coordinates of each correspondence endpoint.
/// * `weights`: one weight per point, typically from [`super::weights::compute_weights`].
///
/// Returns the origin if `points` is empty or every weight is zero.
pub fn weighted_centroid<T: RealField + Copy + Send + Sync>(points: &[Point3<T>], weights: &[T]) -> Point3<T> {
    let weighted: crate::Vec<Point3<T>> = points
        .iter()
        .zip(weights.iter())
        .map(|(point, &weight)| Point3::from(point.coords * weight))
        .collect();

    let total_weight = pairwise_sum(weights, T::zero());
    if total_weight.is_zero() {
        return Point3::origin();
    }

    let summed = pairwise_sum(&weighted, Point3::origin());
    Point3::from(summed.coords / total_weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_centroid_uniform_weights() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let weights = [1.0, 1.0, 1.0];
        let centroid = weighted_centroid(&points, &weights);
        assert_eq!(centroid, Point3::new(2.0 / 3.0, 2.0 / 3.0, 0.0));
    }

    #[test]
    fn test_weighted_centroid_favors_heavier_points() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)];
        let weights = [3.0, 1.0];
        let centroid = weighted_centroid(&points, &weights);
        assert_eq!(centroid, Point3::new(2.5, 0.0, 0.0));
    }

    #[test]
    fn test_weighted_centroid_empty() {
        let centroid = weighted_centroid::<f64>(&[], &[]);
        assert_eq!(centroid, Point3::origin());
    }

    #[test]
    fn test_weighted_centroid_all_zero_weights() {
        let points = [Point3::new(1.0, 1.0, 1.0)];
        let weights = [0.0];
        assert_eq!(weighted_centroid(&points, &weights), Point3::origin());
    }

    #[test]
    fn test_weighted_centroid_agrees_with_f64_reference_accumulator() {
        use rand::{Rng, SeedableRng};

        let mut rng = rand::rngs::SmallRng::seed_from_u64(909090909);
        let points: crate::Vec<Point3<f64>> = (0..16384)
            .map(|_| {
                Point3::new(
                    rng.gen_range(-1000.0..1000.0),
                    rng.gen_range(-1000.0..1000.0),
                    rng.gen_range(-1000.0..1000.0),
                )
            })
            .collect();
        let weights: crate::Vec<f64> = (0..points.len()).map(|_| rng.gen_range(0.1..1.0)).collect();

        let centroid = weighted_centroid(&points, &weights);

        let total_weight: f64 = weights.iter().sum();
        let reference_sum = points.iter().zip(weights.iter()).fold(
            Point3::origin(),
            |acc: Point3<f64>, (p, &w)| Point3::from(acc.coords + p.coords * w),
        );
        let reference = Point3::from(reference_sum.coords / total_weight);

        assert!((centroid.x - reference.x).abs() < 5e-2);
        assert!((centroid.y - reference.y).abs() < 5e-2);
        assert!((centroid.z - reference.z).abs() < 5e-2);
    }
}
