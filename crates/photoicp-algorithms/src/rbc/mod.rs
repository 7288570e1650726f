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

//! The Random Ball Cover: an approximate nearest-neighbour index over
//! photogeometric landmarks.
//!
//! A small number of representatives are drawn from the landmark set; every
//! landmark is then assigned to its nearest representative, forming buckets.
//! A query first finds its nearest representative, then searches only that
//! representative's bucket. This trades exactness for speed: true nearest
//! neighbours that fall just across a bucket boundary can be missed, which is
//! why the outer ICP loop treats correspondences as a conservative estimate
//! rather than ground truth. Any nearest-neighbour strategy meeting that same
//! conservative contract may substitute for this one behind
//! [`NearestNeighbourIndex`].

use nalgebra::{Point, Scalar};
use num_traits::{Bounded, NumOps, Zero};

use crate::{
    kd_tree::KDTree,
    point_clouds::{distance_squared, find_nearest_neighbour_naive},
    Vec,
};

/// A nearest-neighbour index over 4-D photogeometric vectors: three geometric
/// axes plus the colour-mixed scalar axis.
///
/// Abstracted behind a trait so the inner ICP loop is not tied to the Random
/// Ball Cover specifically; a brute-force or K-D-tree-only index satisfies
/// the same conservative-correspondence contract.
pub trait NearestNeighbourIndex<T: Scalar> {
    /// Returns the index, within the landmark set this was built from, of the
    /// (approximate) nearest neighbour to `query`, along with its value.
    /// `None` only when the index holds no landmarks.
    fn nearest(&self, query: &Point<T, 4>) -> Option<(usize, Point<T, 4>)>;
}

struct Bucket<T: Scalar> {
    representative: Point<T, 4>,
    members: Vec<(usize, Point<T, 4>)>,
    tree: Option<KDTree<T, 4>>,
}

/// An approximate nearest-neighbour index built from a fixed number of
/// randomly-chosen representatives and the landmarks assigned to them.
pub struct RandomBallCover<T: Scalar> {
    buckets: Vec<Bucket<T>>,
}

impl<T> RandomBallCover<T>
where
    T: Bounded + Copy + Default + NumOps + PartialOrd + Scalar + Zero,
{
    /// Builds a Random Ball Cover over `landmarks`.
    ///
    /// # Arguments
    /// * `landmarks`: the photogeometric 4-vectors to index, typically the
    ///   output of [`crate::point_clouds::sample_stride`] applied to the
    ///   target cloud.
    /// * `representative_indices`: indices into `landmarks` to use as
    ///   representatives; their count bounds the number of buckets. Callers
    ///   typically choose these by sampling `landmarks` again at a coarser
    ///   stride, matching the "few hundred representatives" scale the
    ///   photogeometric metric was designed for.
    /// * `use_kd_tree`: whether each bucket additionally indexes its members
    ///   with a [`KDTree`], trading setup cost for faster per-bucket queries
    ///   on large buckets.
    ///
    /// Returns an index with zero buckets if either `landmarks` or
    /// `representative_indices` is empty.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument("Build Random Ball Cover", skip_all)
    )]
    pub fn build(
        landmarks: &[Point<T, 4>],
        representative_indices: &[usize],
        use_kd_tree: bool,
    ) -> Self {
        if landmarks.is_empty() || representative_indices.is_empty() {
            return Self { buckets: Vec::new() };
        }

        let mut buckets: Vec<Bucket<T>> = representative_indices
            .iter()
            .map(|&idx| Bucket {
                representative: landmarks[idx],
                members: Vec::new(),
                tree: None,
            })
            .collect();

        for (idx, point) in landmarks.iter().enumerate() {
            let representatives: Vec<Point<T, 4>> =
                buckets.iter().map(|bucket| bucket.representative).collect();
            if let Some((bucket_idx, _)) = find_nearest_neighbour_naive(point, &representatives) {
                buckets[bucket_idx].members.push((idx, *point));
            }
        }

        if use_kd_tree {
            for bucket in buckets.iter_mut() {
                let points: Vec<Point<T, 4>> =
                    bucket.members.iter().map(|(_, point)| *point).collect();
                bucket.tree = Some(KDTree::from(points.as_slice()));
            }
        }

        Self { buckets }
    }
}

impl<T> NearestNeighbourIndex<T> for RandomBallCover<T>
where
    T: Bounded + Copy + Default + NumOps + PartialOrd + Scalar + Zero,
{
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument("Random Ball Cover Query", skip_all, level = "trace")
    )]
    fn nearest(&self, query: &Point<T, 4>) -> Option<(usize, Point<T, 4>)> {
        if self.buckets.is_empty() {
            return None;
        }

        let representatives: Vec<Point<T, 4>> = self
            .buckets
            .iter()
            .map(|bucket| bucket.representative)
            .collect();
        let (bucket_idx, _) = find_nearest_neighbour_naive(query, &representatives)?;
        let bucket = &self.buckets[bucket_idx];

        if let Some(tree) = bucket.tree.as_ref() {
            let nearest_point = tree.nearest(query)?;
            bucket
                .members
                .iter()
                .find(|(_, point)| *point == nearest_point)
                .copied()
        } else {
            let members_only: Vec<Point<T, 4>> =
                bucket.members.iter().map(|(_, point)| *point).collect();
            let (local_idx, point) = find_nearest_neighbour_naive(query, &members_only)?;
            Some((bucket.members[local_idx].0, point))
        }
    }
}

/// A brute-force nearest-neighbour index, for small clouds or as a ground
/// truth oracle in tests.
pub struct BruteForceIndex<T: Scalar> {
    points: Vec<Point<T, 4>>,
}

impl<T: Scalar> BruteForceIndex<T> {
    /// Builds an index that searches `points` in full on every query.
    pub fn new(points: Vec<Point<T, 4>>) -> Self {
        Self { points }
    }
}

impl<T> NearestNeighbourIndex<T> for BruteForceIndex<T>
where
    T: Bounded + Copy + Default + NumOps + PartialOrd + Scalar + Zero,
{
    fn nearest(&self, query: &Point<T, 4>) -> Option<(usize, Point<T, 4>)> {
        find_nearest_neighbour_naive(query, &self.points)
    }
}

/// A conservative assertion used by tests: that an RBC query never returns a
/// neighbour farther than the true nearest by more than `tolerance`.
#[cfg(test)]
fn assert_conservative<T>(
    query: &Point<T, 4>,
    rbc_result: Option<(usize, Point<T, 4>)>,
    brute_force_points: &[Point<T, 4>],
    tolerance: T,
) where
    T: Bounded + Copy + Default + NumOps + PartialOrd + Scalar + Zero + core::fmt::Debug,
{
    let (_, truth) = find_nearest_neighbour_naive(query, brute_force_points).unwrap();
    let (_, found) = rbc_result.unwrap();
    assert!(distance_squared(query, &found) <= distance_squared(query, &truth) + tolerance);
}
