//! # Castles Headless
//!
//! Headless match runner for Castles Clash: drives full simulations
//! without rendering, for balance sweeps, CI determinism checks, and
//! benchmarking.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod runner;
pub mod strategies;
