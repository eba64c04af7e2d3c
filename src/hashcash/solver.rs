// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::{Duration, Instant};

use tokio::{sync::mpsc, task};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::hashcash::{HashcashError, header::Header};

const DEFAULT_POOL_WORKER_NUM: usize = 1;

/// Tuning for [`compute_with_pool`].
#[derive(Debug, Clone, Default)]
pub struct PoolConfig {
    /// Number of parallel workers; zero is treated as one.
    pub worker_num: usize,
    /// Wall-clock budget for the whole pool.
    pub duration: Option<Duration>,
    /// Highest counter value any worker may test. `None` searches the full
    /// u64 domain.
    pub max_iterations: Option<u64>,
}

impl PoolConfig {
    pub fn with_worker_num(mut self, n: usize) -> Self {
        self.worker_num = n;
        self
    }

    pub fn with_duration(mut self, d: Duration) -> Self {
        self.duration = Some(d);
        self
    }

    pub fn with_max_iterations(mut self, max: u64) -> Self {
        self.max_iterations = Some(max);
        self
    }
}

/// Outcome of a successful pool run.
#[derive(Debug, Clone)]
pub struct PoolInfo {
    pub header: Header,
    pub elapsed: Duration,
    pub worker_num: usize,
}

/// Sequential scan: starting from `header.counter`, tests each counter value
/// until the digest satisfies the difficulty.
///
/// Stops with `Cancelled` when the scope is signalled (polled once per
/// iteration) or `MaxIterations` once the counter passes `max_iterations`.
/// `None` means unbounded; the search domain is capped by the u64 counter
/// itself, and overflow also surfaces as `MaxIterations`.
pub fn compute(
    cancel: &CancellationToken,
    mut header: Header,
    max_iterations: Option<u64>,
) -> Result<Header, HashcashError> {
    loop {
        if let Some(max) = max_iterations
            && header.counter > max
        {
            return Err(HashcashError::MaxIterations);
        }

        if cancel.is_cancelled() {
            return Err(HashcashError::Cancelled);
        }

        if header.is_valid() {
            return Ok(header);
        }

        header.counter = header
            .counter
            .checked_add(1)
            .ok_or(HashcashError::MaxIterations)?;
    }
}

/// Partitioned parallel search.
///
/// The counter space `[header.counter, max_iterations]` is split into
/// contiguous chunks of `max_iterations / worker_num`; worker *i* runs the
/// sequential solver over its own copy of the header restricted to chunk *i*
/// (the last worker is clamped to `max_iterations`). The first solution to
/// reach the meeting channel wins and the shared scope is cancelled so the
/// losing workers exit at their next poll. Adjacent chunks share one boundary
/// counter, keeping total work within `max_iterations + worker_num` tests.
pub async fn compute_with_pool(
    cancel: &CancellationToken,
    header: Header,
    config: PoolConfig,
) -> Result<PoolInfo, HashcashError> {
    let worker_num = config.worker_num.max(DEFAULT_POOL_WORKER_NUM);
    let max = config.max_iterations.unwrap_or(u64::MAX);
    let started = Instant::now();

    let scope = cancel.child_token();
    let (tx, mut rx) = mpsc::channel::<Header>(worker_num);

    let padding = header.counter;
    let chunk = max / worker_num as u64;

    for i in 0..worker_num {
        let scope = scope.clone();
        let tx = tx.clone();

        let mut chunk_header = header.clone();
        let since = padding.saturating_add(chunk.saturating_mul(i as u64));
        let until = if i == worker_num - 1 {
            max
        } else {
            since.saturating_add(chunk).min(max)
        };
        chunk_header.counter = since;

        task::spawn_blocking(move || {
            match compute(&scope, chunk_header, Some(until)) {
                // Capacity worker_num: the send cannot fail while the pool
                // still listens, and a late winner is simply dropped.
                Ok(solved) => {
                    let _ = tx.try_send(solved);
                },
                Err(err) => debug!("pool worker {i} stopped: {err}"),
            }
        });
    }

    drop(tx);

    let deadline = async {
        match config.duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => {
            scope.cancel();
            Err(HashcashError::Cancelled)
        },
        _ = deadline => {
            scope.cancel();
            Err(HashcashError::Cancelled)
        },
        received = rx.recv() => {
            scope.cancel();
            match received {
                Some(solved) => Ok(PoolInfo {
                    header: solved,
                    elapsed: started.elapsed(),
                    worker_num,
                }),
                // Every worker exhausted its chunk without a winner.
                None => Err(HashcashError::MaxIterations),
            }
        },
    }
}
