//! Shared utilities.
//!
//! Test helpers for fixture repositories and component trees.

#[cfg(test)]
pub mod testutil;
