// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use anyhow::Result;
use hashgate::{
    cfg::config::BindingKind,
    client::ProtocolError,
    hashcash::{PoolConfig, compute_with_pool},
};
use tokio_util::sync::CancellationToken;

use crate::integration_tests::common::{connect_client, spawn_server};

#[tokio::test]
async fn test_replayed_solution_is_rejected() -> Result<()> {
    let server =
        spawn_server(BindingKind::Store, 2, Duration::from_secs(60)).await?;
    let cancel = CancellationToken::new();
    let client = connect_client(&server, &cancel);

    let challenge = client.send_req().await?;
    let info = compute_with_pool(
        &cancel,
        challenge.header.clone(),
        PoolConfig::default().with_worker_num(2),
    )
    .await?;

    let body = challenge.solution_body(&info.header);
    assert!(client.send_res(&body).await.is_ok());

    // The challenge was redeemed; the identical body must bounce.
    let replay = client.send_res(&body).await;
    let err = replay.expect_err("replay must be rejected");
    let proto = err
        .downcast_ref::<ProtocolError>()
        .expect("server rejection is a protocol error");
    assert_eq!(proto.message, "nonce not found or header expired");

    client.send_disc().await?;

    server.shutdown().await
}
