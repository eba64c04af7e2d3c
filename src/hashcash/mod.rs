//! Hashcash proof-of-work: the challenge header and its solvers.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

pub mod header;
pub mod solver;

pub use header::{Alg, Header, verify};
pub use solver::{PoolConfig, PoolInfo, compute, compute_with_pool};

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HashcashError {
    /// The textual header form could not be decoded. Callers never learn
    /// which field was at fault.
    #[error("header invalid")]
    HeaderInvalid,
    /// The search space was exhausted without a solution.
    #[error("max iterations")]
    MaxIterations,
    /// The cancellation scope was signalled before a solution was found.
    #[error("computation cancelled")]
    Cancelled,
    #[error("rng failure")]
    Rng,
}
