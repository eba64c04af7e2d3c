// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use hashgate::hashcash::{Alg, HashcashError, Header, verify};

#[test]
fn test_generate_defaults() -> Result<()> {
    let header = Header::generate("127.0.0.1", 4, 1665396610)?;

    assert_eq!(header.version, 1);
    assert_eq!(header.difficult, 4);
    assert_eq!(header.alg, Alg::Sha256);
    assert_eq!(header.counter, 0);

    let text = header.to_string();
    let tokens: Vec<&str> = text.split(':').collect();
    assert_eq!(tokens.len(), 7);
    assert_eq!(tokens[0], "1");
    assert_eq!(tokens[4], "sha-256");

    Ok(())
}

#[test]
fn test_canonical_sha256_encoding() -> Result<()> {
    let header = Header {
        version: 1,
        difficult: 20,
        expired_at: 1665396610,
        subject: "localhost".to_string(),
        alg: Alg::Sha256,
        nonce: "vZOxuoIgixP+hw==".to_string(),
        counter: 0,
    };

    assert_eq!(
        header.to_string(),
        "1:20:1665396610:localhost:sha-256:vZOxuoIgixP+hw==:AAAAAAAAAAA="
    );

    Ok(())
}

#[test]
fn test_canonical_sha512_encoding() -> Result<()> {
    let header = Header {
        version: 1,
        difficult: 20,
        expired_at: 1665396610,
        subject: "localhost".to_string(),
        alg: Alg::Sha512,
        nonce: "hVscDCMZcS1WYg==".to_string(),
        counter: 5,
    };

    assert_eq!(
        header.to_string(),
        "1:20:1665396610:localhost:sha-512:hVscDCMZcS1WYg==:BQAAAAAAAAA="
    );

    Ok(())
}

#[test]
fn test_parse_sha256_counter_0() -> Result<()> {
    let header =
        Header::parse("1:20:1665396610:localhost:sha-256:vZOxuoIgixP+hw==:AAAAAAAAAAA=")?;

    assert_eq!(header, Header {
        version: 1,
        difficult: 20,
        expired_at: 1665396610,
        subject: "localhost".to_string(),
        alg: Alg::Sha256,
        nonce: "vZOxuoIgixP+hw==".to_string(),
        counter: 0,
    });

    Ok(())
}

#[test]
fn test_parse_sha512_counter_5() -> Result<()> {
    let header =
        Header::parse("1:20:1665396610:localhost:sha-512:hVscDCMZcS1WYg==:BQAAAAAAAAA=")?;

    assert_eq!(header.alg, Alg::Sha512);
    assert_eq!(header.counter, 5);

    Ok(())
}

#[test]
fn test_parse_six_fields_is_invalid() {
    let result =
        Header::parse("1:665396610:localhost:sha-512:hVscDCMZcS1WYg==:BQAAAAAAAAA=");

    assert_eq!(result, Err(HashcashError::HeaderInvalid));
}

#[test]
fn test_parse_rejects_malformed_fields() {
    // Eight fields.
    assert_eq!(
        Header::parse("1:20:1665396610:local:host:sha-256:vZOxuoIgixP+hw==:AAAAAAAAAAA="),
        Err(HashcashError::HeaderInvalid)
    );
    // Non-numeric difficulty.
    assert_eq!(
        Header::parse("1:x:1665396610:localhost:sha-256:vZOxuoIgixP+hw==:AAAAAAAAAAA="),
        Err(HashcashError::HeaderInvalid)
    );
    // Unknown algorithm names are rejected rather than downgraded.
    assert_eq!(
        Header::parse("1:20:1665396610:localhost:md5:vZOxuoIgixP+hw==:AAAAAAAAAAA="),
        Err(HashcashError::HeaderInvalid)
    );
    // Counter that does not decode to eight bytes.
    assert_eq!(
        Header::parse("1:20:1665396610:localhost:sha-256:vZOxuoIgixP+hw==:BQA="),
        Err(HashcashError::HeaderInvalid)
    );
}

#[test]
fn test_round_trip() -> Result<()> {
    let header = Header::generate("192.168.0.1@5555", 5, 1665396610)?;
    let parsed = Header::parse(&header.to_string())?;

    assert_eq!(header, parsed);

    Ok(())
}

#[test]
fn test_verify_leading_zeroes() {
    assert!(verify("0000a1", 4));
    assert!(verify("0000a1", 0));
    assert!(!verify("0001a1", 4));
    // Difficulty longer than the hash can never pass.
    assert!(!verify("000", 4));
}

#[test]
fn test_hash_matches_canonical_string() -> Result<()> {
    let header =
        Header::parse("1:5:1665396610:localhost:sha-256:vZOxuoIgixP+hw==:AAAAAAAAAAA=")?;

    // The digest is taken over exactly the canonical string bytes.
    assert_eq!(header.hash().len(), 64);
    let again = Header::parse(&header.to_string())?;
    assert_eq!(header.hash(), again.hash());

    Ok(())
}
