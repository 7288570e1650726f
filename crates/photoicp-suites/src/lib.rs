#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! The stateful photogeometric ICP controller.
//!
//! `photoicp-algorithms` computes one inner-loop iteration at a time; [`controller::Icp`]
//! owns a fixed and a moving cloud across a frame pair, drives repeated calls
//! to that inner loop, and tracks the convergence state machine described in
//! the registration pipeline's outer loop: `Idle -> Prepared -> Iterating ->
//! Converged | Exceeded`.

extern crate alloc;

#[cfg(not(feature = "std"))]
pub(crate) use alloc::vec::Vec;
#[cfg(feature = "std")]
pub(crate) use std::vec::Vec;

#[doc = "The stateful `Icp` controller: frame-pair setup, the outer iteration loop, and cancellation."]
pub mod controller;
