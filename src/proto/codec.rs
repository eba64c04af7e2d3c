// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::Bytes;

use crate::proto::{Command, PAYLOAD_DELIMITER, ProtoError, Request, TCP_DELIMITER};

/// Decodes one frame (with or without the trailing `\r`).
///
/// The command token is case-insensitive. For body-bearing commands the
/// declared length must be positive and covered by the frame; bytes past the
/// declared length are ignored. Bodies of unknown commands are discarded.
pub fn parse_frame(frame: &[u8]) -> Result<Request, ProtoError> {
    let trimmed = frame.trim_ascii();

    let (cmd_bytes, args) = match trimmed.iter().position(|&b| b == b' ') {
        Some(pos) => (&trimmed[..pos], trimmed[pos..].trim_ascii()),
        None => (trimmed, &[][..]),
    };

    let token = String::from_utf8_lossy(cmd_bytes).to_ascii_uppercase();
    let cmd = Command::from_token(&token);
    if !cmd.has_body() {
        return Ok(Request::new(cmd, Bytes::new()));
    }

    let delim = args
        .iter()
        .position(|&b| b == PAYLOAD_DELIMITER)
        .ok_or(ProtoError::BodyLen)?;

    let length: usize = std::str::from_utf8(&args[..delim])
        .map_err(|_| ProtoError::BodyLen)?
        .trim()
        .parse()
        .map_err(|_| ProtoError::BodyLen)?;
    if length == 0 {
        return Err(ProtoError::BodyLen);
    }

    let padding = delim + 1;
    if args.len() < padding + length {
        return Err(ProtoError::BodyLen);
    }

    let body = Bytes::copy_from_slice(&args[padding..padding + length]);

    Ok(Request::new(cmd, body))
}

/// Encodes a bare frame: `CMD<CR>`.
pub fn encode_command(cmd: &Command) -> Vec<u8> {
    let tag = cmd.as_str().as_bytes();
    let mut out = Vec::with_capacity(tag.len() + 1);
    out.extend_from_slice(tag);
    out.push(TCP_DELIMITER);
    out
}

/// Encodes a body-bearing frame: `CMD <len> |<body><CR>`.
pub fn encode_with_body(cmd: &Command, body: &[u8]) -> Vec<u8> {
    let tag = cmd.as_str().as_bytes();
    let length = body.len().to_string();

    let mut out = Vec::with_capacity(tag.len() + length.len() + body.len() + 4);
    out.extend_from_slice(tag);
    out.push(b' ');
    out.extend_from_slice(length.as_bytes());
    out.push(b' ');
    out.push(PAYLOAD_DELIMITER);
    out.extend_from_slice(body);
    out.push(TCP_DELIMITER);
    out
}
