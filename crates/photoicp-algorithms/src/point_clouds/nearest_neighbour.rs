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

use nalgebra::{Point, Scalar};
use num_traits::{Bounded, NumOps};

use super::distance::distance_squared;

/// Finds the closest matching target point to the passed source point, by brute force.
///
/// Used as the conservative fallback nearest-neighbour search, and to answer
/// queries within a single Random Ball Cover bucket when that bucket has no
/// K-D tree index of its own.
///
/// # Arguments
/// * `point`: A [`Point`], for which to find the closest point.
/// * `all_points`: A slice of [`Point`], representing the target point cloud.
///
/// # Returns
/// An [`Option`] of `(usize, Point)`, the index and value of the closest point,
/// `None` if `all_points` is empty.
#[inline]
#[cfg_attr(
    feature = "tracing",
    tracing::instrument("Find Closest Points", skip_all)
)]
pub fn find_nearest_neighbour_naive<T, const N: usize>(
    point: &Point<T, N>,
    all_points: &[Point<T, N>],
) -> Option<(usize, Point<T, N>)>
where
    T: Bounded + Copy + Default + NumOps + PartialOrd + Scalar,
{
    if all_points.is_empty() {
        return None;
    }

    let mut current_distance = T::max_value();
    let mut current_index = 0;

    for (idx, target_point) in all_points.iter().enumerate() {
        let distance = distance_squared(point, target_point);
        if distance < current_distance {
            current_distance = distance;
            current_index = idx;
        }
    }

    Some((current_index, all_points[current_index]))
}
