// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use clap::Parser;
use hashgate::{
    cfg::{
        cli::{Cli, CliCommand},
        logger::init_cli_logger,
    },
    client::{self, Challenge, Client},
    hashcash::{self, Header, PoolInfo},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_cli_logger()?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    match &cli.command {
        Some(CliCommand::Compute { headers }) => {
            compute_headers(&cancel, &cli, headers).await
        },
        None => run_client(&cancel, &cli).await,
    }
}

async fn run_client(cancel: &CancellationToken, cli: &Cli) -> Result<()> {
    info!("try connect to {}...", cli.addr);

    let client = Client::new(
        client::Config {
            addr: cli.addr.clone(),
            network: cli.network.clone(),
        },
        cancel.clone(),
    );

    loop {
        let (msg, info) = try_once(cancel, &client, cli).await?;
        info!(
            "ts: {:?}, hash: {}, msg: {}",
            info.elapsed,
            info.header.hash(),
            msg
        );

        if !cli.dos || cancel.is_cancelled() {
            break;
        }
    }

    // Interrupted mid-loop: the read loop is gone, skip the goodbye.
    if !cancel.is_cancelled() {
        client.send_disc().await?;
    }

    Ok(())
}

/// One protected request: fetch a challenge, solve it, redeem the solution.
async fn try_once(
    cancel: &CancellationToken,
    client: &Client,
    cli: &Cli,
) -> Result<(String, PoolInfo)> {
    let challenge: Challenge = client.send_req().await?;

    let info =
        hashcash::compute_with_pool(cancel, challenge.header.clone(), cli.pool_config())
            .await?;

    let body = challenge.solution_body(&info.header);
    let text = client.send_res(&body).await?;

    Ok((String::from_utf8_lossy(&text).into_owned(), info))
}

async fn compute_headers(
    cancel: &CancellationToken,
    cli: &Cli,
    headers: &[String],
) -> Result<()> {
    if headers.is_empty() {
        info!("usage: hashgate-cli compute <header> <header 2> <header n>");
    }

    for arg in headers {
        let header = match Header::parse(arg) {
            Ok(header) => header,
            Err(_) => {
                error!(
                    "header {arg} invalid, use header format: \
                     1:20:1665396610:localhost:sha-512:hVscDCMZcS1WYg==:BQAAAAAAAAA="
                );
                continue;
            },
        };

        info!("try compute hash for {arg}");

        match hashcash::compute_with_pool(cancel, header, cli.pool_config()).await {
            Ok(pool) => {
                info!("solution found:");
                info!("hash: {}", pool.header.hash());
                info!("header: {}", pool.header);
                info!("ts: {:?}", pool.elapsed);
            },
            Err(err) => error!("{err}"),
        }
    }

    Ok(())
}
