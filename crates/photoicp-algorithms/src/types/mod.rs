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

pub mod is_nan;

pub use is_nan::IsNan;

/// Selects whether the means/S-matrix stages weigh each correspondence by
/// `1/(d^2 + eps)` or treat every correspondence equally.
///
/// Modeled as a tagged variant rather than a trait: the kernels these select
/// between are parameterised by this tag instead of living behind a deep
/// trait hierarchy.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WeightingMode {
    /// Every correspondence contributes equally to the centroid and S-matrix.
    Unweighted,
    /// Correspondences are weighted by `1/(d^2 + eps)`, downweighting poor matches.
    #[default]
    Weighted,
}

/// Selects which strategy extracts a rotation (and, for [`RotationMethod::PowerMethod`],
/// a unit quaternion directly) from the accumulated S-matrix.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RotationMethod {
    /// SVD of the 3x3 cross-covariance block, `R = V diag(1,1,det(VU^T)) U^T`.
    Svd,
    /// Power iteration with deflation against the derived symmetric 4x4 matrix,
    /// whose dominant eigenvector is the optimal unit quaternion.
    #[default]
    PowerMethod,
}

/// Selects how the estimated transform is applied to the moving cloud.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TransformMode {
    /// `p' = s * rotate(q, p) + t`, applied per point from the quaternion form.
    #[default]
    Quaternion,
    /// `p' = M p`, where `M` is a 4x4 homogeneous matrix whose upper-left 3x3
    /// has already been pre-multiplied by `s`.
    Matrix,
}
