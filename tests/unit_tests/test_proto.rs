// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use hashgate::proto::{
    Command, ProtoError,
    codec::{encode_command, encode_with_body, parse_frame},
};

#[test]
fn test_encode_bare_commands() {
    assert_eq!(encode_command(&Command::Req), b"REQ\r");
    assert_eq!(encode_command(&Command::Ok), b"OK\r");
    assert_eq!(encode_command(&Command::Disc), b"DISC\r");
}

#[test]
fn test_encode_with_body() {
    assert_eq!(encode_with_body(&Command::Rsv, b"hello"), b"RSV 5 |hello\r");
    assert_eq!(
        encode_with_body(&Command::Err, b"unknown command"),
        b"ERR 15 |unknown command\r"
    );
}

#[test]
fn test_parse_round_trip() -> Result<()> {
    for cmd in [Command::Res, Command::Rsv, Command::Err] {
        let body = b"1:5:1665396610:localhost:sha-256:vZOxuoIgixP+hw==:AAAAAAAAAAA=";
        let frame = encode_with_body(&cmd, body);

        let request = parse_frame(&frame)?;
        assert_eq!(request.cmd, cmd);
        assert_eq!(&request.body[..], body);
    }

    for cmd in [Command::Req, Command::Ok, Command::Disc] {
        let request = parse_frame(&encode_command(&cmd))?;
        assert_eq!(request.cmd, cmd);
        assert!(request.body.is_empty());
    }

    Ok(())
}

#[test]
fn test_parse_lowercase_command() -> Result<()> {
    let request = parse_frame(b"req\r")?;

    assert_eq!(request.cmd, Command::Req);

    Ok(())
}

#[test]
fn test_parse_unknown_command() -> Result<()> {
    let request = parse_frame(b"PING\r")?;

    assert_eq!(request.cmd, Command::Unknown("PING".to_string()));
    assert!(!request.cmd.is_available());

    Ok(())
}

#[test]
fn test_parse_body_with_delimiter_bytes() -> Result<()> {
    // The declared length wins; '|' inside the body is data.
    let request = parse_frame(b"RSV 3 |a|b\r")?;

    assert_eq!(&request.body[..], b"a|b");

    Ok(())
}

#[test]
fn test_parse_extra_bytes_ignored() -> Result<()> {
    let request = parse_frame(b"RSV 5 |helloWORLD\r")?;

    assert_eq!(&request.body[..], b"hello");

    Ok(())
}

#[test]
fn test_parse_body_length_errors() {
    // Zero length is malformed.
    assert_eq!(parse_frame(b"RSV 0 |\r"), Err(ProtoError::BodyLen));
    // Declared length exceeds the frame.
    assert_eq!(parse_frame(b"RSV 10 |hello\r"), Err(ProtoError::BodyLen));
    // Length is not a number.
    assert_eq!(parse_frame(b"RSV five |hello\r"), Err(ProtoError::BodyLen));
    // Missing payload delimiter.
    assert_eq!(parse_frame(b"RSV 5 hello\r"), Err(ProtoError::BodyLen));
    // Body-bearing command without any arguments.
    assert_eq!(parse_frame(b"RES\r"), Err(ProtoError::BodyLen));
}
