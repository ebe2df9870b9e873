//! E2E tests for the SST codec: build tables, encode them into frames,
//! decode the frames back and check the bytes at the frame boundaries.

mod common;
mod container;
mod duplicates;
mod splitting;

// Re-export common utilities for use in submodules
pub use common::*;
