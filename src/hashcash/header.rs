// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::{TryRng, rngs::SysRng};
use sha2::{Digest, Sha256, Sha512};

use crate::hashcash::HashcashError;

// The header travels as seven colon-separated fields:
//
//   version:difficult:expiredAt:subject:alg:nonce:counter
//
// version   - format version, fixed at 1
// difficult - required number of leading '0' characters in the hex hash
// expiredAt - Unix seconds after which the challenge is void
// subject   - identifies the requester (an address with ':' escaped to '@')
// alg       - digest algorithm name
// nonce     - base64 of random bytes, distinct per challenge
// counter   - base64 of a little-endian u64, varied by the solver
//
// Example: 1:20:1665396610:localhost:sha-512:hVscDCMZcS1WYg==:BQAAAAAAAAA=
//
// The string form is canonical: the digest is always taken over exactly
// these bytes, so re-encoding must be bijective.

const DEFAULT_VERSION: u32 = 1;
const DEFAULT_RAND_BYTES: usize = 10;

/// Digest algorithms a header may carry. Anything else is rejected at
/// parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alg {
    #[default]
    Sha256,
    Sha512,
}

impl Alg {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alg::Sha256 => "sha-256",
            Alg::Sha512 => "sha-512",
        }
    }
}

impl fmt::Display for Alg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alg {
    type Err = HashcashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha-256" => Ok(Alg::Sha256),
            "sha-512" => Ok(Alg::Sha512),
            _ => Err(HashcashError::HeaderInvalid),
        }
    }
}

/// A single hashcash challenge. Value data, cheap to copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub difficult: u32,
    pub expired_at: i64,
    pub subject: String,
    pub alg: Alg,
    pub nonce: String,
    pub counter: u64,
}

impl Header {
    /// Creates a fresh challenge with a random nonce and a zero counter.
    pub fn generate(
        subject: &str,
        difficult: u32,
        expired_at: i64,
    ) -> Result<Self, HashcashError> {
        let mut rnd = [0u8; DEFAULT_RAND_BYTES];
        SysRng
            .try_fill_bytes(&mut rnd)
            .map_err(|_| HashcashError::Rng)?;

        Ok(Self {
            version: DEFAULT_VERSION,
            difficult,
            expired_at,
            subject: subject.to_string(),
            alg: Alg::default(),
            nonce: BASE64.encode(rnd),
            counter: 0,
        })
    }

    /// Decodes the canonical seven-field form. Any malformed field yields
    /// `HeaderInvalid` without telling which one.
    pub fn parse(header: &str) -> Result<Self, HashcashError> {
        let tokens: Vec<&str> = header.split(':').collect();
        if tokens.len() != 7 {
            return Err(HashcashError::HeaderInvalid);
        }

        let version = tokens[0]
            .parse::<u32>()
            .map_err(|_| HashcashError::HeaderInvalid)?;
        let difficult = tokens[1]
            .parse::<u32>()
            .map_err(|_| HashcashError::HeaderInvalid)?;
        let expired_at = tokens[2]
            .parse::<i64>()
            .map_err(|_| HashcashError::HeaderInvalid)?;
        let subject = tokens[3].to_string();
        let alg = tokens[4].parse::<Alg>()?;
        let nonce = tokens[5].to_string();

        let counter_bytes = BASE64
            .decode(tokens[6])
            .map_err(|_| HashcashError::HeaderInvalid)?;
        let counter_arr: [u8; 8] = counter_bytes
            .as_slice()
            .try_into()
            .map_err(|_| HashcashError::HeaderInvalid)?;

        Ok(Self {
            version,
            difficult,
            expired_at,
            subject,
            alg,
            nonce,
            counter: u64::from_le_bytes(counter_arr),
        })
    }

    /// Canonical bytes, identical to the `Display` form.
    pub fn bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Hex digest of the canonical string under `alg`.
    pub fn hash(&self) -> String {
        let canonical = self.to_string();
        match self.alg {
            Alg::Sha256 => hex::encode(Sha256::digest(canonical.as_bytes())),
            Alg::Sha512 => hex::encode(Sha512::digest(canonical.as_bytes())),
        }
    }

    pub fn is_valid(&self) -> bool {
        verify(&self.hash(), self.difficult)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}:{}:{}",
            self.version,
            self.difficult,
            self.expired_at,
            self.subject,
            self.alg,
            self.nonce,
            BASE64.encode(self.counter.to_le_bytes())
        )
    }
}

impl FromStr for Header {
    type Err = HashcashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Checks that the first `difficult` characters of the hex hash are `'0'`.
/// A difficulty longer than the hash can never be satisfied.
pub fn verify(hash: &str, difficult: u32) -> bool {
    let difficult = difficult as usize;
    if difficult > hash.len() {
        return false;
    }

    hash.as_bytes()[..difficult].iter().all(|&b| b == 0x30)
}
