//! Shared test utilities for pigeonhunter integration tests.
//!
//! This module provides:
//! - In-memory fakes for every collaborator the pipeline talks to
//! - `TestHarness` wiring them into a `Pipeline`
//! - Builders for configs and messages

pub mod builders;
pub mod fakes;
pub mod harness;

pub use builders::*;
pub use fakes::*;
pub use harness::TestHarness;
