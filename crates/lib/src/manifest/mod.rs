//! Manifest, task, and action types.
//!
//! A manifest is the persisted configuration for one run: which external
//! dependencies to fetch and which local build steps to perform, in order.

mod types;

pub use types::*;
