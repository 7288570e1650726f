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

use nalgebra::{Point, RealField, Scalar};
use num_traits::NumOps;

use super::Point8;

/// Squared Euclidean distance between two points of any dimensionality.
///
/// # Arguments
/// * `a`, `b`: the two [`Point`]s to compare.
#[inline]
pub fn distance_squared<T, const N: usize>(a: &Point<T, N>, b: &Point<T, N>) -> T
where
    T: Copy + NumOps + Scalar,
{
    (0..N).fold(T::default(), |acc, idx| {
        let delta = a[idx] - b[idx];
        acc + delta * delta
    })
}

/// The colour-mixed scalar used as the fourth axis of the photogeometric metric.
///
/// `c = alpha * (r + g + b) / 3`: the mean of the three colour channels, scaled
/// by a blend factor so its magnitude can be tuned against the geometric axes.
#[inline]
pub fn colour_scalar<T: RealField + Copy>(point: &Point8<T>, colour_weight: T) -> T {
    let three = T::one() + T::one() + T::one();
    colour_weight * (point[4] + point[5] + point[6]) / three
}

/// The squared photogeometric distance between two 8-D points.
///
/// Combines the three geometric axes with one colour-mixed scalar axis:
/// `d^2 = (dx^2 + dy^2 + dz^2) + (colour_weight * (dc))^2`, where `dc` is the
/// difference of the two points' [`colour_scalar`] values. This is the metric
/// the Random Ball Cover and nearest-neighbour search both minimise.
///
/// # Arguments
/// * `a`, `b`: the two photogeometric points to compare.
/// * `colour_weight`: blends the colour axis against the geometric ones;
///   `0` recovers plain geometric ICP.
#[inline]
pub fn photogeometric_distance_squared<T: RealField + Copy>(
    a: &Point8<T>,
    b: &Point8<T>,
    colour_weight: T,
) -> T {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    let dc = colour_scalar(a, colour_weight) - colour_scalar(b, colour_weight);

    dx * dx + dy * dy + dz * dz + dc * dc
}
