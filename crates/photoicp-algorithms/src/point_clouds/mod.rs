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

pub use distance::{distance_squared, photogeometric_distance_squared};
pub use nearest_neighbour::find_nearest_neighbour_naive;
pub use sampling::sample_stride;

use nalgebra::{ClosedAddAssign, ClosedDivAssign, Point, Scalar};
use num_traits::{AsPrimitive, One, Zero};

pub(crate) mod distance;
mod nearest_neighbour;
mod sampling;

/// An 8-D photogeometric point: `(x, y, z, 1, r, g, b, 1)`.
///
/// Geometry occupies the first four lanes in millimetres, with the fourth
/// lane carrying a homogeneous `1` padding; colour occupies the last four
/// lanes in `[0, 1]`, with the eighth lane carrying the same padding.
/// Geometry and colour are interleaved in one point because sampling and the
/// Random Ball Cover both operate on whole points, not on separate clouds.
pub type Point8<T> = Point<T, 8>;

/// Returns the `(x, y, z, 1)` homogeneous geometric prefix of an 8-D point.
#[inline]
pub fn geometry_homogeneous<T: Scalar>(point: &Point8<T>) -> Point<T, 4> {
    Point::from([
        point[0].clone(),
        point[1].clone(),
        point[2].clone(),
        point[3].clone(),
    ])
}

/// Returns the `(r, g, b, 1)` colour suffix of an 8-D point.
#[inline]
pub fn colour<T: Scalar>(point: &Point8<T>) -> Point<T, 4> {
    Point::from([
        point[4].clone(),
        point[5].clone(),
        point[6].clone(),
        point[7].clone(),
    ])
}

/// Builds an 8-D photogeometric point from separate geometry and colour.
///
/// # Arguments
/// * `xyz`: the three geometric axes, in millimetres.
/// * `rgb`: the three colour channels, in `[0, 1]`.
#[inline]
pub fn from_geometry_colour<T: Scalar + One>(xyz: [T; 3], rgb: [T; 3]) -> Point8<T> {
    let [x, y, z] = xyz;
    let [r, g, b] = rgb;
    Point::from([x, y, z, T::one(), r, g, b, T::one()])
}

/// Calculates the mean (centroid) of a point cloud.
///
/// # Arguments
/// * `points`: a slice of [`Point`], representing the vectors to average.
///
/// # Returns
/// A [`Point`], representing the centroid. Returns `Point::default()` if `points` is empty.
#[inline]
#[cfg_attr(
    feature = "tracing",
    tracing::instrument("Calculate Mean Point", skip_all)
)]
pub fn calculate_point_cloud_center<T, const N: usize>(points: &[Point<T, N>]) -> Point<T, N>
where
    T: ClosedAddAssign + ClosedDivAssign + Copy + Scalar + Zero,
    usize: AsPrimitive<T>,
{
    if points.is_empty() {
        return Point::default();
    }

    points
        .iter()
        .fold(Point::<T, N>::from([T::zero(); N]), |acc, it| {
            Point::from(acc.coords + it.coords)
        })
        / points.len().as_()
}

/// Generates a randomized 8-D photogeometric point cloud, for tests and property checks.
///
/// Geometry is sampled uniformly within `geometry_range` (millimetres); colour is
/// sampled uniformly within `[0, 1]`. Uses a deterministically-seeded
/// [`rand::rngs::SmallRng`], so repeated test runs see identical clouds.
#[cfg(any(test, feature = "std"))]
pub fn generate_point_cloud<T>(
    num_points: usize,
    geometry_range: core::ops::Range<T>,
) -> crate::Vec<Point8<T>>
where
    T: Scalar + One + Zero + rand::distributions::uniform::SampleUniform,
{
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::SmallRng::seed_from_u64(3765665954583626552);

    (0..num_points)
        .map(|_| {
            from_geometry_colour(
                [
                    rng.gen_range(geometry_range.clone()),
                    rng.gen_range(geometry_range.clone()),
                    rng.gen_range(geometry_range.clone()),
                ],
                [
                    rng.gen_range(T::zero()..T::one()),
                    rng.gen_range(T::zero()..T::one()),
                    rng.gen_range(T::zero()..T::one()),
                ],
            )
        })
        .collect()
}
