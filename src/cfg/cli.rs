// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::{cfg::config::parse_duration, hashcash::PoolConfig};

/// Client command line. Without a subcommand it connects to the server,
/// solves the issued challenge and prints the protected resource.
#[derive(Debug, Parser)]
#[command(name = "hashgate-cli", about = "Hashcash-gated quotation client")]
pub struct Cli {
    /// Solver pool size
    #[arg(short = 'w', long = "workers", default_value_t = 2)]
    pub workers: usize,

    /// Cap on tested counter values; unlimited when omitted
    #[arg(short = 'i', long = "iterations")]
    pub iterations: Option<u64>,

    /// Wall-clock budget for one solve, e.g. "10s"; unlimited when omitted
    #[arg(short = 'd', long = "duration", value_parser = duration_value)]
    pub duration: Option<Duration>,

    /// Server address
    #[arg(short = 'a', long = "addr", default_value = "localhost:3333")]
    pub addr: String,

    /// Network to dial; only tcp variants are supported
    #[arg(short = 'n', long = "network", default_value = "tcp")]
    pub network: String,

    /// Keep requesting and solving in a loop until interrupted
    #[arg(short = 's', long = "dos")]
    pub dos: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Solve raw challenge headers offline and print the solutions
    Compute {
        /// Challenge headers in their canonical text form
        headers: Vec<String>,
    },
}

impl Cli {
    pub fn pool_config(&self) -> PoolConfig {
        let mut config = PoolConfig::default().with_worker_num(self.workers);

        if let Some(max) = self.iterations {
            config = config.with_max_iterations(max);
        }
        if let Some(d) = self.duration {
            config = config.with_duration(d);
        }

        config
    }
}

fn duration_value(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|err| err.to_string())
}
