// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{env, time::Duration};

use anyhow::{Context, Result, bail, ensure};

/// Runtime settings, read from the environment with defaults. Every value is
/// validated before use.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub pow: PowConfig,
    /// Which challenge-binding strategy the deployment runs.
    pub binding: BindingKind,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address (`ADDR`).
    pub addr: String,
    /// Listen network (`NETWORK`); only TCP variants are supported.
    pub network: String,
    /// Drain grace granted to each connection on shutdown
    /// (`GRACEFUL_CONN_CLOSE_DEADLINE`).
    pub graceful_conn_close_deadline: Duration,
}

/// Challenge parameters shared by issuance and verification.
#[derive(Debug, Clone)]
pub struct PowConfig {
    /// Required number of leading zero characters (`HASH_CASH_DIFFICULT`).
    pub difficult: u32,
    /// Challenge time-to-live (`HASH_CASH_EXPIRED_DURATION`).
    pub expired_duration: Duration,
}

/// Deployment-time choice between the stateful challenge store and the
/// stateless token (`POW_BINDING`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Store,
    Token,
}

impl Config {
    pub fn load_from_env() -> Result<Self> {
        let deadline = env_or("GRACEFUL_CONN_CLOSE_DEADLINE", "5s");
        let difficult = env_or("HASH_CASH_DIFFICULT", "5");
        let expired = env_or("HASH_CASH_EXPIRED_DURATION", "10m");

        let binding = match env_or("POW_BINDING", "store").as_str() {
            "store" => BindingKind::Store,
            "token" => BindingKind::Token,
            other => bail!("POW_BINDING must be store or token, got {other:?}"),
        };

        let config = Self {
            server: ServerConfig {
                addr: env_or("ADDR", "localhost:3333"),
                network: env_or("NETWORK", "tcp"),
                graceful_conn_close_deadline: parse_duration(&deadline)
                    .context("GRACEFUL_CONN_CLOSE_DEADLINE")?,
            },
            pow: PowConfig {
                difficult: difficult.parse().context("HASH_CASH_DIFFICULT")?,
                expired_duration: parse_duration(&expired)
                    .context("HASH_CASH_EXPIRED_DURATION")?,
            },
            binding,
        };

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.server.addr.is_empty(), "ADDR must not be empty");
        ensure!(
            self.server.network.starts_with("tcp"),
            "NETWORK must be a tcp variant, got {:?}",
            self.server.network
        );
        ensure!(
            !self.pow.expired_duration.is_zero(),
            "HASH_CASH_EXPIRED_DURATION must be positive"
        );

        Ok(())
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Parses compound duration strings such as "300ms", "5s", "10m" or "1h30m":
/// one or more `<number><unit>` segments with units ns/us/ms/s/m/h.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    ensure!(!s.is_empty(), "empty duration");

    let mut total = Duration::ZERO;
    let mut rest = s;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .context("duration segment is missing a unit")?;
        ensure!(digits_end > 0, "invalid duration {s:?}");

        let value: u64 = rest[..digits_end]
            .parse()
            .with_context(|| format!("invalid duration {s:?}"))?;

        let unit_end = rest[digits_end..]
            .find(|c: char| c.is_ascii_digit())
            .map_or(rest.len(), |pos| digits_end + pos);
        let unit = &rest[digits_end..unit_end];

        let segment = match unit {
            "ns" => Duration::from_nanos(value),
            "us" => Duration::from_micros(value),
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3600)),
            other => bail!("unknown duration unit {other:?} in {s:?}"),
        };

        total = total.saturating_add(segment);
        rest = &rest[unit_end..];
    }

    Ok(total)
}
