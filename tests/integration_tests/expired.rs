// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use anyhow::Result;
use hashgate::{
    cfg::config::BindingKind,
    client::ProtocolError,
    hashcash::{PoolConfig, compute_with_pool},
};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::integration_tests::common::{connect_client, spawn_server};

#[tokio::test]
async fn test_expired_challenge_store_binding() -> Result<()> {
    let server =
        spawn_server(BindingKind::Store, 1, Duration::from_millis(300)).await?;
    let cancel = CancellationToken::new();
    let client = connect_client(&server, &cancel);

    let challenge = client.send_req().await?;
    let info = compute_with_pool(
        &cancel,
        challenge.header.clone(),
        PoolConfig::default().with_worker_num(2),
    )
    .await?;

    // Let the issued challenge fall out of the store.
    sleep(Duration::from_millis(400)).await;

    let err = client
        .send_res(&challenge.solution_body(&info.header))
        .await
        .expect_err("expired challenge must be rejected");
    let proto = err
        .downcast_ref::<ProtocolError>()
        .expect("server rejection is a protocol error");
    assert_eq!(proto.message, "nonce not found or header expired");

    client.send_disc().await?;

    server.shutdown().await
}

#[tokio::test]
async fn test_expired_challenge_token_binding() -> Result<()> {
    let server =
        spawn_server(BindingKind::Token, 1, Duration::from_secs(1)).await?;
    let cancel = CancellationToken::new();
    let client = connect_client(&server, &cancel);

    let challenge = client.send_req().await?;
    let info = compute_with_pool(
        &cancel,
        challenge.header.clone(),
        PoolConfig::default().with_worker_num(2),
    )
    .await?;

    // Wait out the absolute deadline carried in the header.
    sleep(Duration::from_millis(1200)).await;

    let err = client
        .send_res(&challenge.solution_body(&info.header))
        .await
        .expect_err("expired challenge must be rejected");
    let proto = err
        .downcast_ref::<ProtocolError>()
        .expect("server rejection is a protocol error");
    assert_eq!(proto.message, "header expired");

    client.send_disc().await?;

    server.shutdown().await
}
