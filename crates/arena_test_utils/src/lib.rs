//! # Arena Test Utilities
//!
//! Shared testing utilities for the arena crates:
//! - Determinism test harness
//! - Fixture records and worlds
//! - Property-based testing strategies
//! - Test log setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod strategies;
mod tracing_setup;

pub use tracing_setup::init_test_tracing;

/// Re-export proptest for convenience.
pub use proptest;
