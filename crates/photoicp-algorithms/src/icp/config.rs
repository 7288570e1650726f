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
use num_traits::One;

use crate::types::{RotationMethod, TransformMode, WeightingMode};

/// Configuration for a single photogeometric ICP inner-loop iteration.
///
/// Built via [`IcpConfig::builder`], mirroring the fluent (non-type-state)
/// builder used elsewhere in this crate: every field has a sensible default,
/// so callers only override what they need.
#[derive(Clone, Copy, Debug)]
pub struct IcpConfig<T> {
    pub(crate) use_kd_tree: bool,
    pub(crate) num_landmarks: usize,
    pub(crate) num_representatives: usize,
    pub(crate) weighting_mode: WeightingMode,
    pub(crate) rotation_method: RotationMethod,
    pub(crate) transform_mode: TransformMode,
    pub(crate) colour_weight: T,
    pub(crate) scale_damping: T,
    pub(crate) scale_locked: bool,
    pub(crate) max_iterations: usize,
    pub(crate) mse_absolute_threshold: Option<T>,
    pub(crate) mse_interval_threshold: T,
    pub(crate) angle_threshold: T,
    pub(crate) translation_threshold: T,
}

impl<T: Copy + One> IcpConfig<T> {
    /// Starts building a new configuration from the default values.
    pub fn builder() -> IcpConfigBuilder<T>
    where
        T: RealField,
    {
        IcpConfigBuilder {
            config: IcpConfig {
                use_kd_tree: true,
                num_landmarks: 16384,
                num_representatives: 256,
                weighting_mode: WeightingMode::Weighted,
                rotation_method: RotationMethod::PowerMethod,
                transform_mode: TransformMode::Quaternion,
                colour_weight: nalgebra::convert(1e-6),
                scale_damping: nalgebra::convert(1e-6),
                scale_locked: false,
                max_iterations: 30,
                mse_absolute_threshold: None,
                mse_interval_threshold: T::zero(),
                angle_threshold: nalgebra::convert(1e-3),
                translation_threshold: nalgebra::convert(1e-2),
            },
        }
    }

    /// Whether each Random Ball Cover bucket should also be indexed by a K-D tree.
    pub fn use_kd_tree(&self) -> bool {
        self.use_kd_tree
    }

    /// The maximum number of landmarks sampled from each frame.
    pub fn num_landmarks(&self) -> usize {
        self.num_landmarks
    }

    /// The number of Random Ball Cover representatives.
    pub fn num_representatives(&self) -> usize {
        self.num_representatives
    }

    /// The correspondence weighting strategy.
    pub fn weighting_mode(&self) -> WeightingMode {
        self.weighting_mode
    }

    /// The rotation extraction strategy.
    pub fn rotation_method(&self) -> RotationMethod {
        self.rotation_method
    }

    /// The transform application strategy.
    pub fn transform_mode(&self) -> TransformMode {
        self.transform_mode
    }

    /// The blend factor between the geometric and colour axes of the photogeometric metric.
    pub fn colour_weight(&self) -> T {
        self.colour_weight
    }

    /// Whether the similarity scale factor is held fixed at `1` (rigid ICP).
    pub fn scale_locked(&self) -> bool {
        self.scale_locked
    }

    /// The small constant added to the S-matrix's `sc_den` scalar before
    /// recovering scale, preventing blow-up when the source landmarks sit
    /// near the origin.
    pub fn scale_damping(&self) -> T {
        self.scale_damping
    }

    /// The maximum number of outer-loop iterations.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// The absolute MSE threshold below which the outer loop is considered converged.
    pub fn mse_absolute_threshold(&self) -> Option<T> {
        self.mse_absolute_threshold
    }

    /// The minimum MSE improvement between iterations below which the outer loop stops.
    pub fn mse_interval_threshold(&self) -> T {
        self.mse_interval_threshold
    }

    /// The per-iteration rotation angle, in radians, below which the outer
    /// loop's convergence test passes (alongside [`Self::translation_threshold`]).
    pub fn angle_threshold(&self) -> T {
        self.angle_threshold
    }

    /// The per-iteration translation norm below which the outer loop's
    /// convergence test passes (alongside [`Self::angle_threshold`]).
    pub fn translation_threshold(&self) -> T {
        self.translation_threshold
    }
}

/// A fluent builder for [`IcpConfig`].
#[derive(Clone, Copy, Debug)]
pub struct IcpConfigBuilder<T> {
    config: IcpConfig<T>,
}

impl<T: Copy> IcpConfigBuilder<T> {
    /// Sets whether each Random Ball Cover bucket is also indexed by a K-D tree.
    pub fn with_kd_tree(self, use_kd_tree: bool) -> Self {
        Self {
            config: IcpConfig {
                use_kd_tree,
                ..self.config
            },
        }
    }

    /// Sets the maximum number of landmarks sampled from each frame.
    pub fn with_num_landmarks(self, num_landmarks: usize) -> Self {
        Self {
            config: IcpConfig {
                num_landmarks,
                ..self.config
            },
        }
    }

    /// Sets the number of Random Ball Cover representatives.
    pub fn with_num_representatives(self, num_representatives: usize) -> Self {
        Self {
            config: IcpConfig {
                num_representatives,
                ..self.config
            },
        }
    }

    /// Sets the correspondence weighting strategy.
    pub fn with_weighting_mode(self, weighting_mode: WeightingMode) -> Self {
        Self {
            config: IcpConfig {
                weighting_mode,
                ..self.config
            },
        }
    }

    /// Sets the rotation extraction strategy.
    pub fn with_rotation_method(self, rotation_method: RotationMethod) -> Self {
        Self {
            config: IcpConfig {
                rotation_method,
                ..self.config
            },
        }
    }

    /// Sets the transform application strategy.
    pub fn with_transform_mode(self, transform_mode: TransformMode) -> Self {
        Self {
            config: IcpConfig {
                transform_mode,
                ..self.config
            },
        }
    }

    /// Sets the blend factor between the geometric and colour axes of the photogeometric metric.
    pub fn with_colour_weight(self, colour_weight: T) -> Self {
        Self {
            config: IcpConfig {
                colour_weight,
                ..self.config
            },
        }
    }

    /// Locks the similarity scale factor to `1`, performing rigid rather than similarity ICP.
    pub fn with_scale_locked(self, scale_locked: bool) -> Self {
        Self {
            config: IcpConfig {
                scale_locked,
                ..self.config
            },
        }
    }

    /// Sets the damping constant added to `sc_den` during scale recovery.
    pub fn with_scale_damping(self, scale_damping: T) -> Self {
        Self {
            config: IcpConfig {
                scale_damping,
                ..self.config
            },
        }
    }

    /// Sets the maximum number of outer-loop iterations.
    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            config: IcpConfig {
                max_iterations,
                ..self.config
            },
        }
    }

    /// Sets the absolute MSE threshold below which the outer loop is considered converged.
    pub fn with_absolute_mse_threshold(self, threshold: T) -> Self {
        Self {
            config: IcpConfig {
                mse_absolute_threshold: Some(threshold),
                ..self.config
            },
        }
    }

    /// Sets the minimum MSE improvement between iterations below which the outer loop stops.
    pub fn with_mse_interval_threshold(self, threshold: T) -> Self {
        Self {
            config: IcpConfig {
                mse_interval_threshold: threshold,
                ..self.config
            },
        }
    }

    /// Sets the per-iteration rotation angle, in radians, below which the
    /// outer loop's convergence test passes.
    pub fn with_angle_threshold(self, angle_threshold: T) -> Self {
        Self {
            config: IcpConfig {
                angle_threshold,
                ..self.config
            },
        }
    }

    /// Sets the per-iteration translation norm below which the outer loop's
    /// convergence test passes.
    pub fn with_translation_threshold(self, translation_threshold: T) -> Self {
        Self {
            config: IcpConfig {
                translation_threshold,
                ..self.config
            },
        }
    }

    /// Finalizes the configuration.
    pub fn build(self) -> IcpConfig<T> {
        self.config
    }
}
