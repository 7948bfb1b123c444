//! Shared utilities for the forecast workspace
//!
//! This crate provides common functionality used across the workspace,
//! including logging setup and environment-driven configuration lookup.

pub mod config;
pub mod logging;

pub use config::{EnvError, EnvLookup, ProcessEnv};
pub use logging::{LogFormat, init_stderr_tracing, init_tracing};
