#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! The photogeometric ICP math core: sampling, the Random Ball Cover
//! nearest-neighbour index, weights, means, deviations, the S-matrix,
//! rotation extraction (SVD and Power Method) and transform application.
//!
//! This crate only ever performs one outer-loop iteration's worth of work at
//! a time; the stateful controller that drives iterations to convergence
//! lives in `photoicp-suites`.

extern crate alloc;

#[cfg(not(feature = "std"))]
pub(crate) use alloc::{boxed::Box, collections::BTreeMap as HashMap, vec, vec::Vec};
#[cfg(feature = "std")]
pub(crate) use std::{boxed::Box, collections::HashMap, vec, vec::Vec};

pub(crate) use core::{array, cmp::Ordering, fmt::Debug, iter::Sum, marker, ops};

#[doc = "8-D photogeometric points, sampling, the nearest-neighbour naive baseline, and the photogeometric distance metric."]
pub mod point_clouds;

#[doc = "A generic K-D tree over `Point<T, N>`, used as the optional per-bucket index inside the Random Ball Cover."]
pub mod kd_tree;

#[doc = "The Random Ball Cover: partitions landmarks by nearest representative and answers approximate nearest-neighbour queries."]
pub mod rbc;

#[doc = "Fixed-fan-in pairwise-tree reductions, the basis of the weights/means/S-matrix accumulations."]
pub mod reductions;

#[doc = "Configuration, error types, and the photogeometric ICP inner-loop stages: weights, means, deviations, S-matrix, rotation extraction, and transform application."]
pub mod icp;

#[doc = "Common types shared across the stages: tagged configuration variants and the `IsNan` helper trait."]
pub mod types;
