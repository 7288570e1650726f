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

//! The `Icp` controller: owns a frame pair's fixed and moving clouds, drives
//! `photoicp_algorithms::icp::icp_iteration` to convergence, and tracks the
//! outer-loop state machine `Idle -> Prepared -> Iterating -> Converged | Exceeded`.

use nalgebra::{Point3, RealField};

use photoicp_algorithms::{
    icp::{icp_iteration, IcpConfig, IcpError, IcpResult},
    point_clouds::Point8,
    types::TransformMode,
};
pub use photoicp_algorithms::icp::TransformRecord;

use crate::Vec;

/// The controller's outer-loop state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IcpState {
    /// No frame pair has been registered yet; [`Icp::init`] has not been called.
    Idle,
    /// A frame pair was registered via [`Icp::init`]; no [`Icp::step`] has run yet.
    Prepared,
    /// At least one iteration has run and neither stop condition has been met.
    Iterating,
    /// The most recent iteration's delta was below both convergence thresholds.
    Converged,
    /// `max_iterations` was reached without satisfying the convergence thresholds.
    Exceeded,
}

/// The outcome of one call to [`Icp::step`].
#[derive(Clone, Copy, Debug)]
pub struct StepOutcome<T> {
    /// The cumulative transform after this step, `T` composed over every prior iteration.
    pub transform: TransformRecord<T>,
    /// `true` if this step's own delta was below both the angle and translation thresholds.
    pub converged: bool,
    /// `true` if this step's S-matrix was rank-deficient; `transform` did not
    /// change from the previous step in that case.
    pub degenerate: bool,
    /// The mean squared geometric error over this step's correspondences.
    pub mse: T,
}

/// Why [`Icp::register`] stopped iterating.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RegisterStatus {
    /// Both convergence thresholds were satisfied.
    Converged,
    /// `max_iterations` was reached first.
    Exceeded,
}

/// The outcome of a full call to [`Icp::register`].
#[derive(Clone, Copy, Debug)]
pub struct RegisterOutcome<T> {
    /// The final cumulative transform.
    pub transform: TransformRecord<T>,
    /// The number of outer-loop iterations run.
    pub iterations: usize,
    /// Why the loop stopped.
    pub status: RegisterStatus,
    /// The mean squared geometric error at the final iteration.
    pub mse: T,
}

/// The stateful photogeometric ICP controller for one fixed/moving frame pair.
///
/// `F` (the fixed/reference cloud) and the original `M` (the moving cloud)
/// are stored once, at [`Icp::init`], and never mutated; every [`Icp::step`]
/// instead folds its estimated delta into the cumulative transform and
/// re-applies that cumulative transform to the original `M` when computing
/// correspondences, which is numerically equivalent to transforming `M` in
/// place every iteration but avoids repeatedly rewriting its buffer.
pub struct Icp<T> {
    config: IcpConfig<T>,
    state: IcpState,
    fixed: Vec<Point8<T>>,
    moving: Vec<Point8<T>>,
    /// `moving` with the cumulative transform applied; recomputed once per
    /// [`Icp::init`]/[`Icp::step`] call rather than on every read of
    /// [`Icp::transformed_moving`].
    transformed: Vec<Point8<T>>,
    transform: TransformRecord<T>,
    iterations_run: usize,
    cancelled: bool,
}

impl<T: RealField + Copy + Send + Sync> Icp<T> {
    /// Constructs a controller with the given configuration. Call [`Icp::init`]
    /// before the first [`Icp::step`] or [`Icp::register`].
    pub fn new(config: IcpConfig<T>) -> Self {
        Self {
            config,
            state: IcpState::Idle,
            fixed: Vec::new(),
            moving: Vec::new(),
            transformed: Vec::new(),
            transform: TransformRecord::identity(),
            iterations_run: 0,
            cancelled: false,
        }
    }

    /// Registers the fixed and moving clouds for a new frame pair, resetting
    /// the cumulative transform to identity and the iteration count to zero.
    ///
    /// # Errors
    /// Returns [`IcpError::EmptyPointCloud`] if either cloud has no points.
    #[cfg_attr(feature = "tracing", tracing::instrument("ICP Init", skip_all))]
    pub fn init(&mut self, fixed: &[Point8<T>], moving: &[Point8<T>]) -> IcpResult<T, ()> {
        if fixed.is_empty() || moving.is_empty() {
            return Err(IcpError::EmptyPointCloud);
        }

        self.fixed = fixed.to_vec();
        self.moving = moving.to_vec();
        self.transform = TransformRecord::identity();
        self.iterations_run = 0;
        self.cancelled = false;
        self.state = IcpState::Prepared;
        self.refresh_transformed();

        Ok(())
    }

    fn refresh_transformed(&mut self) {
        self.transformed = self
            .moving
            .iter()
            .map(|point| {
                let geometry = Point3::new(point[0], point[1], point[2]);
                let transformed = match self.config.transform_mode() {
                    TransformMode::Quaternion => self.transform.apply_point_quaternion(&geometry),
                    TransformMode::Matrix => self.transform.apply_point_matrix(&geometry),
                };
                let mut out = *point;
                out[0] = transformed.x;
                out[1] = transformed.y;
                out[2] = transformed.z;
                out
            })
            .collect();
    }

    /// Requests that the next [`Icp::step`] or [`Icp::register`] call observe
    /// cancellation, mirroring a user-facing cancellation token checked at
    /// iteration boundaries.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// The controller's current outer-loop state.
    pub fn state(&self) -> IcpState {
        self.state
    }

    /// The number of outer-loop iterations run against the current frame pair.
    pub fn iterations_run(&self) -> usize {
        self.iterations_run
    }

    /// The cumulative transform estimated so far.
    pub fn transform(&self) -> TransformRecord<T> {
        self.transform
    }

    /// The moving cloud as registered at [`Icp::init`], with the cumulative
    /// transform applied: geometry is rotated, translated and scaled, colour
    /// passes through unchanged. A borrow of the controller's own scratch
    /// buffer, refreshed at the end of every [`Icp::init`] and [`Icp::step`]
    /// call rather than recomputed on read.
    pub fn transformed_moving(&self) -> &[Point8<T>] {
        &self.transformed
    }

    /// Runs one outer-loop iteration: samples landmarks from the moving
    /// cloud, searches the Random Ball Cover over the fixed cloud's
    /// landmarks, weighs the correspondences, accumulates the S-matrix,
    /// extracts a rotation, recovers translation and scale, and composes the
    /// result into the cumulative transform.
    ///
    /// Advances [`Icp::state`] to [`IcpState::Converged`] if this step's own
    /// delta is below both [`IcpConfig::angle_threshold`] and
    /// [`IcpConfig::translation_threshold`]; to [`IcpState::Exceeded`] if
    /// [`IcpConfig::max_iterations`] has now been reached; otherwise to
    /// [`IcpState::Iterating`].
    ///
    /// # Errors
    /// Returns [`IcpError::Cancelled`] if [`Icp::cancel`] was called since the
    /// last step. Propagates any error `icp_iteration` surfaces (an empty
    /// cloud, or a stage that could not produce a result); the controller
    /// remains in its prior state and can be retried or reinitialised.
    #[cfg_attr(feature = "tracing", tracing::instrument("ICP Step", skip_all))]
    pub fn step(&mut self) -> IcpResult<T, StepOutcome<T>> {
        if self.cancelled {
            return Err(IcpError::Cancelled);
        }

        let outcome = icp_iteration(&self.moving, &self.fixed, &self.transform, &self.config)?;

        self.transform = outcome.transform;
        self.iterations_run += 1;
        self.refresh_transformed();

        let angle = outcome.step.rotation.angle();
        let translation_norm = outcome.step.translation.norm();
        // A degenerate step's delta is the identity by construction, which would
        // otherwise trivially satisfy both thresholds; a rank-deficient S-matrix
        // means this iteration didn't actually constrain a rotation, so it must
        // not be mistaken for having converged.
        let converged = !outcome.degenerate
            && angle < self.config.angle_threshold()
            && translation_norm < self.config.translation_threshold();

        self.state = if converged {
            log::trace!(
                "Converged after {} iterations with an MSE of {}",
                self.iterations_run,
                outcome.mse
            );
            IcpState::Converged
        } else if self.iterations_run >= self.config.max_iterations() {
            IcpState::Exceeded
        } else {
            IcpState::Iterating
        };

        Ok(StepOutcome {
            transform: self.transform,
            converged,
            degenerate: outcome.degenerate,
            mse: outcome.mse,
        })
    }

    /// Runs [`Icp::step`] until convergence, cancellation, `max_iterations` is
    /// exhausted, or a stage error occurs.
    ///
    /// Reaching `max_iterations` without converging is not an error: the loop
    /// stops and returns the last cumulative transform with
    /// [`RegisterStatus::Exceeded`], per the controller's non-retrying
    /// failure policy for recoverable stop conditions.
    ///
    /// # Errors
    /// Returns [`IcpError::EmptyPointCloud`] if [`Icp::init`] has not been
    /// called. Propagates [`IcpError::Cancelled`] or any stage error from
    /// [`Icp::step`]; the last successful transform remains available via
    /// [`Icp::transform`] even after an error.
    #[cfg_attr(feature = "tracing", tracing::instrument("ICP Register", skip_all))]
    pub fn register(&mut self) -> IcpResult<T, RegisterOutcome<T>> {
        if self.state == IcpState::Idle {
            return Err(IcpError::EmptyPointCloud);
        }

        loop {
            let outcome = self.step()?;

            match self.state {
                IcpState::Converged => {
                    return Ok(RegisterOutcome {
                        transform: outcome.transform,
                        iterations: self.iterations_run,
                        status: RegisterStatus::Converged,
                        mse: outcome.mse,
                    })
                }
                IcpState::Exceeded => {
                    return Ok(RegisterOutcome {
                        transform: outcome.transform,
                        iterations: self.iterations_run,
                        status: RegisterStatus::Exceeded,
                        mse: outcome.mse,
                    })
                }
                IcpState::Iterating | IcpState::Idle | IcpState::Prepared => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoicp_algorithms::{
        point_clouds::from_geometry_colour,
        types::RotationMethod,
    };

    fn unit_cube_cloud() -> Vec<Point8<f64>> {
        let geometry = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 0.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.5, 0.5, 0.5],
            [0.25, 0.75, 0.1],
        ];
        geometry
            .into_iter()
            .map(|xyz| from_geometry_colour(xyz, [0.5, 0.5, 0.5]))
            .collect()
    }

    /// A wider, non-planar synthetic cloud whose points are spaced far enough
    /// apart (dominant axis step of 12 units) that a translation of a couple
    /// of units cannot cause the nearest-neighbour search to pick the wrong
    /// correspondence, so single-iteration recovery is deterministic.
    fn spread_cloud(n: usize) -> Vec<Point8<f64>> {
        (0..n)
            .map(|i| {
                let x = i as f64 * 12.0;
                let y = (i % 4) as f64 * 3.0;
                let z = (i % 3) as f64 * 2.0;
                from_geometry_colour([x, y, z], [0.4, 0.6, 0.2])
            })
            .collect()
    }

    fn test_config() -> IcpConfig<f64> {
        IcpConfig::builder()
            .with_kd_tree(false)
            .with_rotation_method(RotationMethod::Svd)
            .with_max_iterations(10)
            .build()
    }

    #[test]
    fn test_new_controller_starts_idle() {
        let controller = Icp::new(test_config());
        assert_eq!(controller.state(), IcpState::Idle);
        assert_eq!(controller.iterations_run(), 0);
    }

    #[test]
    fn test_step_before_init_errors() {
        let mut controller = Icp::new(test_config());
        let result = controller.step();
        assert!(matches!(result, Err(IcpError::EmptyPointCloud)));
    }

    #[test]
    fn test_init_rejects_empty_clouds() {
        let mut controller = Icp::new(test_config());
        let cloud = unit_cube_cloud();
        assert!(matches!(
            controller.init(&[], &cloud),
            Err(IcpError::EmptyPointCloud)
        ));
    }

    #[test]
    fn test_init_moves_to_prepared() {
        let mut controller = Icp::new(test_config());
        let cloud = unit_cube_cloud();
        controller.init(&cloud, &cloud).unwrap();
        assert_eq!(controller.state(), IcpState::Prepared);
    }

    #[test]
    fn test_identity_clouds_converge_in_one_step() {
        let mut controller = Icp::new(test_config());
        let cloud = unit_cube_cloud();
        controller.init(&cloud, &cloud).unwrap();

        let outcome = controller.step().unwrap();
        assert!(outcome.converged);
        assert_eq!(controller.state(), IcpState::Converged);
        assert!(outcome.transform.rotation.angle() < 1e-3);
        assert!(outcome.transform.translation.norm() < 1e-2);
    }

    #[test]
    fn test_register_recovers_pure_translation() {
        let source = spread_cloud(20);
        let target: Vec<Point8<f64>> = source
            .iter()
            .map(|p| from_geometry_colour([p[0] + 2.0, p[1] - 1.0, p[2] + 0.5], [0.4, 0.6, 0.2]))
            .collect();

        let mut controller = Icp::new(test_config());
        controller.init(&target, &source).unwrap();

        let outcome = controller.register().unwrap();
        assert_eq!(outcome.status, RegisterStatus::Converged);
        assert!((outcome.transform.translation.x - 2.0).abs() < 0.1);
        assert!((outcome.transform.translation.y + 1.0).abs() < 0.1);
        assert!((outcome.transform.translation.z - 0.5).abs() < 0.1);
    }

    #[test]
    fn test_register_recovers_pure_rotation() {
        use nalgebra::{UnitQuaternion, Vector3};

        let source = spread_cloud(30);
        let axis = Vector3::new(1.0, 1.0, 1.0).normalize();
        let rotation = UnitQuaternion::from_axis_angle(&nalgebra::Unit::new_normalize(axis), 15f64.to_radians());
        let target: Vec<Point8<f64>> = source
            .iter()
            .map(|p| {
                let rotated = rotation * Vector3::new(p[0], p[1], p[2]);
                from_geometry_colour([rotated.x, rotated.y, rotated.z], [0.4, 0.6, 0.2])
            })
            .collect();

        let mut controller = Icp::new(
            IcpConfig::builder()
                .with_kd_tree(false)
                .with_rotation_method(RotationMethod::Svd)
                .with_max_iterations(10)
                .build(),
        );
        controller.init(&target, &source).unwrap();

        let outcome = controller.register().unwrap();
        let expected_inverse = rotation.inverse();
        let angle_error = outcome.transform.rotation.angle_to(&expected_inverse);
        assert!(angle_error < 1e-2, "angle error was {angle_error}");
    }

    #[test]
    fn test_register_stops_with_cancelled_mid_loop() {
        let source = spread_cloud(20);
        let target: Vec<Point8<f64>> = source
            .iter()
            .map(|p| from_geometry_colour([p[0] + 2.0, p[1] - 1.0, p[2] + 0.5], [0.4, 0.6, 0.2]))
            .collect();

        let mut controller = Icp::new(test_config());
        controller.init(&target, &source).unwrap();
        controller.cancel();

        assert!(matches!(controller.register(), Err(IcpError::Cancelled)));
        // The last successful (here: the identity) transform remains available.
        assert_eq!(controller.iterations_run(), 0);
    }

    #[test]
    fn test_cancel_is_observed_on_next_step() {
        let mut controller = Icp::new(test_config());
        let cloud = unit_cube_cloud();
        controller.init(&cloud, &cloud).unwrap();
        controller.cancel();

        assert!(matches!(controller.step(), Err(IcpError::Cancelled)));
    }

    #[test]
    fn test_register_reports_exceeded_without_crashing_on_degenerate_moving_cloud() {
        // every point in the moving cloud is identical: the S-matrix is rank-deficient
        // every iteration, so the controller should keep emitting the identity delta
        // until max_iterations rather than ever reporting convergence or crashing.
        let target = unit_cube_cloud();
        let repeated_point = from_geometry_colour([0.3, 0.3, 0.3], [0.5, 0.5, 0.5]);
        let source = vec![repeated_point; 10];

        let mut controller = Icp::new(test_config());
        controller.init(&target, &source).unwrap();

        let outcome = controller.register().unwrap();
        assert_eq!(outcome.status, RegisterStatus::Exceeded);
        assert_eq!(outcome.iterations, controller.config.max_iterations());
    }
}
