// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Configuration for the runsight CLI
//!
//! This module provides the command-line/environment configuration for one
//! supervised run: the producer command to launch, the stdout marker, the
//! first-event timeout and output switches.

use std::time::Duration;

use clap::Parser;
use runsight_events::DEFAULT_MARKER;

/// runsight - watch a test runner's event stream as it executes
#[derive(Parser, Debug, Clone)]
#[command(name = "runsight")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Marker prefixing monitor event lines on the producer's stdout
    #[arg(long, env = "RUNSIGHT_MARKER", default_value = DEFAULT_MARKER)]
    pub marker: String,

    /// Seconds to wait for the first event before abandoning the run
    ///
    /// If the producer neither connects nor prints a monitor line within
    /// this window, accumulated state is discarded.
    #[arg(long, env = "RUNSIGHT_FIRST_EVENT_TIMEOUT", default_value = "30")]
    pub first_event_timeout_secs: u64,

    /// Print the execution tree after the run finishes
    #[arg(short, long, default_value = "false")]
    pub tree: bool,

    /// Print the flattened HTTP log view instead of scenario nesting
    #[arg(long, default_value = "false")]
    pub http_logs: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Producer command and its arguments
    ///
    /// The chosen event port is exported to the producer as
    /// RUNSIGHT_EVENTS_PORT.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Config {
    /// The first-event window as a [`Duration`]
    #[must_use]
    pub fn first_event_timeout(&self) -> Duration {
        Duration::from_secs(self.first_event_timeout_secs)
    }

    /// Whether the rendered tree shows full scenario nesting
    #[must_use]
    pub fn show_scenarios(&self) -> bool {
        !self.http_logs
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the marker is blank or the timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker.trim().is_empty() {
            return Err(ConfigError::BlankMarker);
        }
        if self.first_event_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The stdout marker may not be blank
    #[error("Marker must not be blank")]
    BlankMarker,

    /// The first-event timeout must be positive
    #[error("First-event timeout must be at least one second")]
    ZeroTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(
            std::iter::once("runsight").chain(args.iter().copied()),
        )
        .expect("parse args")
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["runner", "test"]);
        assert_eq!(config.marker, DEFAULT_MARKER);
        assert_eq!(config.first_event_timeout_secs, 30);
        assert!(!config.tree);
        assert!(!config.http_logs);
        assert!(config.show_scenarios());
        assert_eq!(config.command, vec!["runner".to_string(), "test".to_string()]);
    }

    #[test]
    fn test_command_is_required() {
        assert!(Config::try_parse_from(["runsight"]).is_err());
    }

    #[test]
    fn test_trailing_args_stay_with_the_command() {
        let config = parse(&["runner", "--tags", "@smoke"]);
        assert_eq!(
            config.command,
            vec![
                "runner".to_string(),
                "--tags".to_string(),
                "@smoke".to_string()
            ]
        );
    }

    #[test]
    fn test_http_logs_hides_scenarios() {
        let config = parse(&["--http-logs", "runner"]);
        assert!(!config.show_scenarios());
    }

    #[test]
    fn test_validate_blank_marker() {
        let mut config = parse(&["runner"]);
        config.marker = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::BlankMarker)));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = parse(&["runner"]);
        config.first_event_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn test_log_level_flags() {
        assert_eq!(parse(&["runner"]).log_level(), tracing::Level::INFO);
        assert_eq!(parse(&["-v", "runner"]).log_level(), tracing::Level::DEBUG);
        assert_eq!(parse(&["-q", "runner"]).log_level(), tracing::Level::WARN);
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
