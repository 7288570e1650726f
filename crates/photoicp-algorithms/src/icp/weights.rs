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

use nalgebra::RealField;

use crate::{types::WeightingMode, Vec};

/// Computes one weight per correspondence from its squared photogeometric distance.
///
/// Under [`WeightingMode::Weighted`], `weight = 1 / (distance_squared + eps)`,
/// downweighting correspondences the Random Ball Cover placed far apart
/// without letting an exact match (`distance_squared == 0`) divide by zero.
/// Under [`WeightingMode::Unweighted`], every correspondence gets weight `1`.
///
/// # Arguments
/// * `distances_squared`: the squared photogeometric distance of each correspondence.
/// * `mode`: the weighting strategy.
/// * `eps`: the denominator floor; should be small relative to the expected
///   squared distance scale.
pub fn compute_weights<T: RealField + Copy + Send + Sync>(
    distances_squared: &[T],
    mode: WeightingMode,
    eps: T,
) -> Vec<T> {
    match mode {
        WeightingMode::Unweighted => distances_squared.iter().map(|_| T::one()).collect(),
        WeightingMode::Weighted => distances_squared
            .iter()
            .map(|&distance_squared| T::one() / (distance_squared + eps))
            .collect(),
    }
}
