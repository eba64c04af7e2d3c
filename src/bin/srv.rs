// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::env;

use anyhow::{Context, Result};
use hashgate::{
    cfg::{
        config::{BindingKind, Config},
        logger::init_logger,
    },
    setup,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let logger_path =
        env::var("LOGGER_CONFIG").unwrap_or_else(|_| "conf/logger.yaml".to_string());
    let _guard = init_logger(&logger_path)?;

    let config = Config::load_from_env().context("load config")?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                cancel.cancel();
            }
        });
    }

    let environment = setup::setup(&config).await.context("setup")?;
    info!(
        "listening on {} ({} binding)",
        config.server.addr,
        match config.binding {
            BindingKind::Store => "store",
            BindingKind::Token => "token",
        }
    );

    environment.server.serve(cancel).await.context("serve")
}
