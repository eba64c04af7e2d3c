// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::time::Duration;

use anyhow::{Context, Result};
use hashgate::{
    cfg::config::{BindingKind, Config, PowConfig, ServerConfig},
    client::{self, Client},
    setup::build_server,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

pub struct TestServer {
    pub addr: String,
    pub cancel: CancellationToken,
    pub handle: JoinHandle<Result<()>>,
}

impl TestServer {
    /// Cancels the server and waits for the accept loop to drain.
    pub async fn shutdown(self) -> Result<()> {
        self.cancel.cancel();
        self.handle.await.context("server task")?
    }
}

/// Runs a fully wired server on an ephemeral port.
pub async fn spawn_server(
    binding: BindingKind,
    difficult: u32,
    ttl: Duration,
) -> Result<TestServer> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind test listener")?;
    let addr = listener.local_addr()?.to_string();

    let config = Config {
        server: ServerConfig {
            addr: addr.clone(),
            network: "tcp".to_string(),
            graceful_conn_close_deadline: Duration::from_secs(1),
        },
        pow: PowConfig {
            difficult,
            expired_duration: ttl,
        },
        binding,
    };

    let server = build_server(listener, &config)?;

    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { server.serve(cancel).await }
    });

    Ok(TestServer {
        addr,
        cancel,
        handle,
    })
}

pub fn connect_client(server: &TestServer, cancel: &CancellationToken) -> Client {
    Client::new(
        client::Config {
            addr: server.addr.clone(),
            network: "tcp".to_string(),
        },
        cancel.clone(),
    )
}

/// Writes raw bytes and reads one `\r`-terminated reply frame.
pub async fn raw_round_trip(stream: &mut TcpStream, frame: &[u8]) -> Result<Vec<u8>> {
    stream.write_all(frame).await?;

    let mut reply = Vec::with_capacity(256);
    let mut byte = [0u8; 1];
    loop {
        let n = stream.read(&mut byte).await?;
        anyhow::ensure!(n == 1, "connection closed before frame terminator");
        if byte[0] == b'\r' {
            return Ok(reply);
        }
        reply.push(byte[0]);
    }
}
