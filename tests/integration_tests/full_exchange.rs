// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use anyhow::Result;
use hashgate::{
    cfg::config::BindingKind,
    hashcash::{PoolConfig, compute_with_pool},
};
use tokio_util::sync::CancellationToken;

use crate::integration_tests::common::{connect_client, spawn_server};

#[tokio::test]
async fn test_full_exchange_store_binding() -> Result<()> {
    let server =
        spawn_server(BindingKind::Store, 2, Duration::from_secs(60)).await?;
    let cancel = CancellationToken::new();
    let client = connect_client(&server, &cancel);

    let challenge = client.send_req().await?;
    assert!(challenge.token.is_none());
    assert_eq!(challenge.header.difficult, 2);

    let info = compute_with_pool(
        &cancel,
        challenge.header.clone(),
        PoolConfig::default().with_worker_num(2),
    )
    .await?;
    assert!(info.header.is_valid());

    let quote = client
        .send_res(&challenge.solution_body(&info.header))
        .await?;
    assert!(!quote.is_empty());

    client.send_disc().await?;

    server.shutdown().await
}

#[tokio::test]
async fn test_full_exchange_token_binding() -> Result<()> {
    let server =
        spawn_server(BindingKind::Token, 2, Duration::from_secs(60)).await?;
    let cancel = CancellationToken::new();
    let client = connect_client(&server, &cancel);

    let challenge = client.send_req().await?;
    assert!(challenge.token.is_some(), "token binding must announce a tag");

    let info = compute_with_pool(
        &cancel,
        challenge.header.clone(),
        PoolConfig::default().with_worker_num(2),
    )
    .await?;

    let quote = client
        .send_res(&challenge.solution_body(&info.header))
        .await?;
    assert!(!quote.is_empty());

    client.send_disc().await?;

    server.shutdown().await
}

#[tokio::test]
async fn test_challenges_stay_independent_per_request() -> Result<()> {
    let server =
        spawn_server(BindingKind::Store, 1, Duration::from_secs(60)).await?;
    let cancel = CancellationToken::new();
    let client = connect_client(&server, &cancel);

    let first = client.send_req().await?;
    let second = client.send_req().await?;

    // Distinct nonces: every REQ gets its own challenge.
    assert_ne!(first.header.nonce, second.header.nonce);

    client.send_disc().await?;

    server.shutdown().await
}
