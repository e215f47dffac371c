//! Unit tests for the rollout CLI
//!
//! These tests use mocked dependencies and run fast without external I/O.

mod exit_codes;
mod helpers;
mod policy_file;
mod property_tests;
