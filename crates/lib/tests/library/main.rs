//! Integration tests for octopus-lib.

mod common;
mod components_tests;
mod freeze_tests;
mod run_tests;
