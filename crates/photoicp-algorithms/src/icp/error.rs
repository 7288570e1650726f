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

use core::fmt::Debug;

/// The inner-loop stage a [`IcpError::ComputeFailed`] originated from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    /// Landmark/representative sampling.
    Sampling,
    /// Random Ball Cover build or query.
    Rbc,
    /// Per-correspondence weight computation.
    Weights,
    /// Weighted centroid computation.
    Means,
    /// Deviation-from-centroid computation.
    Deviations,
    /// Cross-covariance (S-matrix) accumulation.
    SMatrix,
    /// Rotation extraction (SVD or Power Method).
    Rotation,
    /// Transform application to the moving cloud.
    Transform,
}

/// An error produced while preparing or iterating photogeometric ICP.
#[derive(Debug, thiserror::Error)]
pub enum IcpError<T: Debug> {
    /// Either the source or target point cloud had no points.
    #[error("one of the point clouds passed to ICP was empty")]
    EmptyPointCloud,
    /// `max_iterations` was configured to `0`.
    #[error("ICP was configured to run for zero iterations")]
    ZeroIterations,
    /// `mse_interval_threshold` was not a finite, non-negative value.
    #[error("mse_interval_threshold must be finite and non-negative, got {0:?}")]
    InvalidThreshold(T),
    /// A stage could not produce a result, typically because every
    /// correspondence was filtered out (e.g. by a distance or weight cutoff).
    #[error("ICP stage {stage:?} could not compute a result")]
    ComputeFailed {
        /// The stage that failed.
        stage: Stage,
    },
    /// The outer loop exhausted `max_iterations` without reaching either
    /// convergence threshold.
    #[error("ICP did not converge after {iterations} iterations, last MSE was {mse:?}")]
    DidNotConverge {
        /// The mean squared error at the final iteration.
        mse: T,
        /// The number of iterations run.
        iterations: usize,
    },
    /// The caller's cancellation token was observed to be cancelled.
    #[error("ICP was cancelled before convergence")]
    Cancelled,
}

/// The result type returned by the photogeometric ICP stages.
pub type IcpResult<T, U> = Result<U, IcpError<T>>;
