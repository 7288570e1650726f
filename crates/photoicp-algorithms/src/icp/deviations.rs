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

use nalgebra::{Point3, RealField, Vector3};

use crate::Vec;

/// Computes each point's deviation from the given centroid: `point - centroid`.
pub fn deviations_from_centroid<T: RealField + Copy>(
    points: &[Point3<T>],
    centroid: &Point3<T>,
) -> Vec<Vector3<T>> {
    points.iter().map(|point| point - centroid).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deviations_from_centroid() {
        let points = [Point3::new(1.0, 2.0, 3.0), Point3::new(-1.0, -2.0, -3.0)];
        let centroid = Point3::new(0.0, 0.0, 0.0);
        let devs = deviations_from_centroid(&points, &centroid);
        assert_eq!(devs, Vec::from([Vector3::new(1.0, 2.0, 3.0), Vector3::new(-1.0, -2.0, -3.0)]));
    }

    #[test]
    fn test_deviations_are_relative_to_nonzero_centroid() {
        let points = [Point3::new(5.0, 5.0, 5.0)];
        let centroid = Point3::new(2.0, 1.0, 0.0);
        let devs = deviations_from_centroid(&points, &centroid);
        assert_eq!(devs, Vec::from([Vector3::new(3.0, 4.0, 5.0)]));
    }
}
