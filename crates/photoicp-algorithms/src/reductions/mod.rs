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

//! Fixed-fan-in pairwise-tree summation.
//!
//! Plain left-to-right folds accumulate floating-point rounding error that
//! depends on iteration order; running the same correspondences through
//! [`std::iter::Sum`] sequentially versus in parallel chunks can yield
//! different rounding in the last few bits. Summing pairwise instead, in a
//! fixed fan-in-2 tree, gives the same result regardless of whether the
//! leaves were produced serially or by the `parallel` feature's chunked
//! workers, because the tree shape depends only on the element count.

use core::ops::Add;

/// Sums a slice pairwise: `[a, b, c, d]` sums as `(a + b) + (c + d)`, not
/// `((a + b) + c) + d`. The result is independent of whether `values` was
/// assembled serially or by concatenating parallel chunks, as long as the
/// per-chunk order is preserved.
///
/// Returns `zero` for an empty slice.
///
/// Under the `parallel` feature, the same fixed fan-in-2 tree is evaluated by
/// a `rayon` fork-join instead of plain recursion once `values` is large
/// enough to be worth splitting across threads; both paths visit leaves in
/// the same order, so they agree to the last bit.
#[cfg(not(feature = "parallel"))]
pub fn pairwise_sum<T>(values: &[T], zero: T) -> T
where
    T: Add<Output = T> + Copy,
{
    sequential_pairwise_sum(values, zero)
}

/// See [`pairwise_sum`].
#[cfg(feature = "parallel")]
pub fn pairwise_sum<T>(values: &[T], zero: T) -> T
where
    T: Add<Output = T> + Copy + Send + Sync,
{
    const PARALLEL_THRESHOLD: usize = 256;

    if values.len() < PARALLEL_THRESHOLD {
        return sequential_pairwise_sum(values, zero);
    }

    let mid = values.len() / 2;
    let (left, right) = values.split_at(mid);
    let (left_sum, right_sum) = rayon::join(
        || pairwise_sum(left, zero),
        || pairwise_sum(right, zero),
    );
    left_sum + right_sum
}

fn sequential_pairwise_sum<T>(values: &[T], zero: T) -> T
where
    T: Add<Output = T> + Copy,
{
    match values.len() {
        0 => zero,
        1 => values[0],
        len => {
            let mid = len / 2;
            sequential_pairwise_sum(&values[..mid], zero) + sequential_pairwise_sum(&values[mid..], zero)
        }
    }
}
