// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for runsight-events

use thiserror::Error;

/// Errors that can occur while decoding runner event streams
#[derive(Debug, Error)]
pub enum EventsError {
    /// Error parsing JSON
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Error reading from the event transport
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Marker line carried something other than a monitor event
    #[error("Invalid monitor line: {message}")]
    InvalidMonitorLine {
        /// Description of the format error
        message: String,
    },
}
