//! # corral
//!
//! Runs one command inside new mount, UTS, and PID namespaces, under a
//! changed root and a cgroup pid limit.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod commands;

use std::process::ExitCode;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
