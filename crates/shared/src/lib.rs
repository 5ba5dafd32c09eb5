//! Shared utilities for the attendance workspace.
//!
//! This crate provides functionality used across the other crates:
//! - Retry policy with exponential backoff for transient store conflicts

pub mod retry;

pub use retry::RetryPolicy;
