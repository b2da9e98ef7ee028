// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! runsight-events: test-runner event model and stream framing
//!
//! This library crate defines the two event vocabularies spoken by the test
//! runner and the decoders that turn raw transport bytes into typed events.

#![warn(missing_docs)]

//! ## Protocols
//!
//! The runner reports progress over two distinct channels, depending on how
//! it was launched:
//!
//! - **Socket protocol** — full lifecycle events ([`RunnerEvent`]) as JSON
//!   objects written back-to-back over a TCP connection, possibly
//!   fragmented across reads. Framed by [`framing::JsonFrameDecoder`].
//! - **Stdout monitor protocol** — coarse progress events
//!   ([`MonitorEvent`]) on marker-prefixed stdout lines, intermixed with
//!   plain diagnostic output. Framed by [`framing::LineDecoder`] and
//!   classified by [`parse_monitor_line`].
//!
//! ```rust
//! use runsight_events::framing::{JsonFrameDecoder, decode_events};
//!
//! let mut decoder = JsonFrameDecoder::new();
//! let frames = decoder.push(br#"{"eventType":"FEATURE_START","thread":"t1"}"#);
//! let events = decode_events(&frames);
//! assert_eq!(events[0].event_type, "FEATURE_START");
//! ```

pub mod error;
pub mod event;
pub mod framing;
pub mod monitor;

pub use error::EventsError;
pub use event::{EventKind, RunnerEvent};
pub use monitor::{DEFAULT_MARKER, MonitorEvent, MonitorLine, parse_monitor_line};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::EventsError;
    pub use crate::event::{EventKind, RunnerEvent};
    pub use crate::framing::{JsonFrameDecoder, LineDecoder, decode_events};
    pub use crate::monitor::{DEFAULT_MARKER, MonitorEvent, MonitorLine, parse_monitor_line};
}
