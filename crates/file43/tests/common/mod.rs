//! Shared test utilities for file43 integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated test execution with temp directories
//! - `ScriptedTranscoder`, an engine stand-in that records every dispatch

pub mod harness;
pub mod transcoder;

pub use harness::TestHarness;
pub use transcoder::{Gate, ScriptedTranscoder};
