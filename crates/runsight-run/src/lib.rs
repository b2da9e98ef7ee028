// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! runsight-run library
//!
//! This module exports the run-supervision layer of runsight for use in
//! integration tests and as a library: session lifecycle, CLI
//! configuration and plain-text rendering.

pub mod config;
pub mod render;
pub mod session;

pub use config::{Config, ConfigError};
pub use session::{
    OutputCallback, PORT_ENV_VAR, RunError, RunSession, RunState, SessionOptions,
};
