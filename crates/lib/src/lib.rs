//! octopus-lib: manifest-driven build orchestration.
//!
//! A manifest lists tasks made of primitive actions (clone, execute, copy,
//! remove). This crate provides:
//! - `config`: loading and persisting manifests, floating and stable
//! - `execute`: running task lists with per-task isolation
//! - `freeze`: pinning floating checkouts to their current revisions
//! - `components`: ordering, building, staging, and merging local components

pub mod components;
pub mod config;
pub mod consts;
pub mod execute;
pub mod freeze;
pub mod git;
pub mod manifest;
mod util;
