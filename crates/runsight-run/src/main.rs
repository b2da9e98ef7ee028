// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! runsight: watch a test runner's event stream as it executes
//!
//! This binary crate supervises one producer run: it binds the event
//! socket, spawns the producer with the port in its environment, streams
//! passthrough output, and prints the final summary (and optionally the
//! execution tree) when the producer exits.

use anyhow::Context;
use clap::Parser;
use tracing::info;

use runsight_run::config::Config;
use runsight_run::render::{render_summary, render_tree};
use runsight_run::session::{RunSession, SessionOptions};
use runsight_tree::TreeProjection;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    config.validate().context("invalid configuration")?;

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut session = RunSession::bind(SessionOptions {
        marker: config.marker.clone(),
        first_event_timeout: config.first_event_timeout(),
    })
    .await
    .context("bind event listener")?;

    session.subscribe_output(Box::new(|line| println!("{line}")));

    let program = &config.command[0];
    let args = &config.command[1..];
    session
        .spawn(program, args)
        .with_context(|| format!("spawn producer: {program}"))?;

    let status = session.wait().await.context("wait for producer")?;
    info!(?status, "producer finished");

    let all_passed = session.with_state(|state| {
        print!("{}", render_summary(state.summary.summary()));
        if config.tree {
            let projection = TreeProjection::new(config.show_scenarios());
            let tree = if config.show_scenarios() {
                state.executions.tree()
            } else {
                state.network.tree()
            };
            print!("{}", render_tree(tree, &projection));
        }
        state.summary.summary().all_passed()
    });

    if !all_passed || !status.success() {
        std::process::exit(1);
    }
    Ok(())
}
