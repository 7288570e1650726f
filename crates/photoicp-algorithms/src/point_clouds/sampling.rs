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

/// Deterministically thins a point cloud down to at most `target_count` landmarks.
///
/// Picks points at a fixed stride (`len / target_count`, rounded up) rather than
/// at random, so that repeated calls against the same cloud pick the same
/// landmarks and downstream correspondence search stays reproducible frame to
/// frame. A `target_count` of `0` or a cloud no larger than `target_count`
/// returns the input unchanged (by index).
///
/// # Arguments
/// * `len`: the number of points in the source cloud.
/// * `target_count`: the desired number of landmarks; `0` means "use all points".
///
/// # Returns
/// The indices into the source cloud to keep, in ascending order.
pub fn sample_stride(len: usize, target_count: usize) -> crate::Vec<usize> {
    if len == 0 {
        return crate::Vec::new();
    }
    if target_count == 0 || len <= target_count {
        return (0..len).collect();
    }

    let stride = len.div_ceil(target_count);
    (0..len).step_by(stride).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_stride_keeps_everything_below_target() {
        assert_eq!(sample_stride(5, 10), crate::Vec::from([0, 1, 2, 3, 4]));
    }

    #[test]
    fn test_sample_stride_zero_target_keeps_everything() {
        assert_eq!(sample_stride(4, 0), crate::Vec::from([0, 1, 2, 3]));
    }

    #[test]
    fn test_sample_stride_thins_large_cloud() {
        let indices = sample_stride(1000, 100);
        assert!(indices.len() <= 100);
        assert!(indices.len() >= 90);
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sample_stride_empty() {
        assert!(sample_stride(0, 10).is_empty());
    }
}
