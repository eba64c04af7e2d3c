//! Line-oriented request/response protocol spoken between client and server.
//!
//! Frames are byte sequences terminated by a single `\r`. Body-bearing
//! frames carry an explicit decimal byte count ahead of a `|` delimiter:
//!
//! ```text
//! RSV 5 |hello<CR>
//! REQ<CR>
//! ```

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

pub mod codec;
pub mod connection;

use std::fmt;

use bytes::Bytes;
use thiserror::Error;

/// Byte separating the declared body length from the body itself.
pub const PAYLOAD_DELIMITER: u8 = b'|';
/// Frame terminator; never part of the payload.
pub const TCP_DELIMITER: u8 = b'\r';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtoError {
    #[error("body length incorrect")]
    BodyLen,
}

/// Leading command tag of a frame. Tags outside the protocol are preserved
/// as `Unknown` so each side can apply its own policy (the server answers
/// with an error, the client drops the frame).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Client asks for a challenge.
    Req,
    /// Client submits a solution.
    Res,
    /// Server payload response: a challenge or the resource.
    Rsv,
    /// Acknowledgement.
    Ok,
    /// Textual error.
    Err,
    /// Orderly close.
    Disc,
    Unknown(String),
}

impl Command {
    pub fn as_str(&self) -> &str {
        match self {
            Command::Req => "REQ",
            Command::Res => "RES",
            Command::Rsv => "RSV",
            Command::Ok => "OK",
            Command::Err => "ERR",
            Command::Disc => "DISC",
            Command::Unknown(raw) => raw,
        }
    }

    /// RES, RSV and ERR carry a length-prefixed body; the rest are bare.
    pub fn has_body(&self) -> bool {
        matches!(self, Command::Res | Command::Rsv | Command::Err)
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Command::Unknown(_))
    }

    pub(crate) fn from_token(token: &str) -> Self {
        match token {
            "REQ" => Command::Req,
            "RES" => Command::Res,
            "RSV" => Command::Rsv,
            "OK" => Command::Ok,
            "ERR" => Command::Err,
            "DISC" => Command::Disc,
            other => Command::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed inbound frame. The body is opaque to the codec. The server
/// stamps the requester identity on the way to the handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub cmd: Command,
    pub body: Bytes,
    subject: Option<String>,
}

impl Request {
    pub fn new(cmd: Command, body: Bytes) -> Self {
        Self {
            cmd,
            body,
            subject: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Client identity injected by the server before dispatch.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }
}
