// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::{cache::Cache, hashcash::header::Header};

type HmacSha256 = Hmac<Sha256>;

/// Separates the token from the header in a strategy-A response body.
pub const TOKEN_DELIMITER: u8 = b'\n';

/// Reasons a submitted solution is turned away. The messages are the exact
/// bodies of the ERR frames the client sees.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("header invalid")]
    HeaderInvalid,
    #[error("nonce not found or header expired")]
    UnknownNonce,
    #[error("hash wrong")]
    HashWrong,
    #[error("token wrong")]
    TokenWrong,
    #[error("header expired")]
    HeaderExpired,
    #[error("internal server")]
    Internal,
}

/// Ties an issued challenge to the client that requested it.
///
/// `issue` renders the RSV body announcing a fresh challenge; `admit` checks
/// a RES body against what was issued and yields the solved header. The two
/// implementations trade state for replay protection: [`StoreBinding`] keeps
/// every outstanding challenge and redeems it once, [`TokenBinding`] keeps
/// nothing and trusts a keyed tag instead.
pub trait ChallengeBinding: Send + Sync {
    fn issue(&self, header: &Header) -> Result<String, VerifyError>;
    fn admit(&self, body: &[u8]) -> Result<Header, VerifyError>;
}

/// Stateful strategy: issued challenges live in an expiring store keyed by
/// nonce until they are solved or time out.
pub struct StoreBinding {
    store: Cache<Header>,
}

impl StoreBinding {
    pub fn new(store: Cache<Header>) -> Self {
        Self { store }
    }
}

impl ChallengeBinding for StoreBinding {
    fn issue(&self, header: &Header) -> Result<String, VerifyError> {
        self.store.set(&header.nonce, header.clone());

        Ok(header.to_string())
    }

    fn admit(&self, body: &[u8]) -> Result<Header, VerifyError> {
        let text =
            std::str::from_utf8(body).map_err(|_| VerifyError::HeaderInvalid)?;
        let header = Header::parse(text).map_err(|_| VerifyError::HeaderInvalid)?;

        // An expired entry is indistinguishable from one never issued.
        let origin = self
            .store
            .lookup(&header.nonce)
            .ok_or(VerifyError::UnknownNonce)?;

        if origin.version != header.version
            || origin.difficult != header.difficult
            || origin.subject != header.subject
            || origin.expired_at != header.expired_at
            || origin.alg != header.alg
        {
            return Err(VerifyError::HeaderInvalid);
        }

        if !header.is_valid() {
            return Err(VerifyError::HashWrong);
        }

        // Single use: a solved challenge cannot be replayed.
        self.store.delete(&header.nonce);

        Ok(header)
    }
}

/// Stateless strategy: the RSV body is `tag\nheader` where the tag is an
/// HMAC-SHA-256 over the issue-time fields under a server-held secret. Any
/// field change invalidates the tag; a valid tag replays until expiry.
pub struct TokenBinding {
    secret: Vec<u8>,
}

impl TokenBinding {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac(&self, header: &Header) -> Result<HmacSha256, VerifyError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| VerifyError::Internal)?;
        mac.update(header.nonce.as_bytes());
        mac.update(header.subject.as_bytes());
        mac.update(header.alg.as_str().as_bytes());
        mac.update(header.expired_at.to_string().as_bytes());

        Ok(mac)
    }

    fn token(&self, header: &Header) -> Result<String, VerifyError> {
        Ok(hex::encode(self.mac(header)?.finalize().into_bytes()))
    }
}

impl ChallengeBinding for TokenBinding {
    fn issue(&self, header: &Header) -> Result<String, VerifyError> {
        Ok(format!("{}\n{}", self.token(header)?, header))
    }

    fn admit(&self, body: &[u8]) -> Result<Header, VerifyError> {
        let pos = body
            .iter()
            .position(|&b| b == TOKEN_DELIMITER)
            .ok_or(VerifyError::TokenWrong)?;
        let (token_part, header_part) = (&body[..pos], &body[pos + 1..]);

        let text = std::str::from_utf8(header_part)
            .map_err(|_| VerifyError::HeaderInvalid)?;
        let header = Header::parse(text).map_err(|_| VerifyError::HeaderInvalid)?;

        if header.expired_at <= Utc::now().timestamp() {
            return Err(VerifyError::HeaderExpired);
        }

        let token_hex =
            std::str::from_utf8(token_part).map_err(|_| VerifyError::TokenWrong)?;
        let tag = hex::decode(token_hex.trim()).map_err(|_| VerifyError::TokenWrong)?;
        self.mac(&header)?
            .verify_slice(&tag)
            .map_err(|_| VerifyError::TokenWrong)?;

        if !header.is_valid() {
            return Err(VerifyError::HashWrong);
        }

        Ok(header)
    }
}
