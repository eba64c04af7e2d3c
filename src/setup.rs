// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use anyhow::{Context, Result};
use rand::{TryRng, rngs::SysRng};
use tokio::net::TcpListener;

use crate::{
    cache::Cache,
    cfg::config::{BindingKind, Config},
    proto::Command,
    quotes::{
        Handler, Quotes,
        binding::{ChallengeBinding, StoreBinding, TokenBinding},
        middleware::pow_middleware,
    },
    server::{HandleFunc, HandlerFuture, Server},
};

pub struct Environment {
    pub server: Server,
}

/// Binds the listener and assembles the fully wired server.
pub async fn setup(config: &Config) -> Result<Environment> {
    let listener = TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("bind {}", config.server.addr))?;

    Ok(Environment {
        server: build_server(listener, config)?,
    })
}

/// Wires quotes, binding strategy and handlers onto `listener`. Split from
/// [`setup`] so tests can hand in a listener on an ephemeral port.
pub fn build_server(listener: TcpListener, config: &Config) -> Result<Server> {
    let server = Server::new(listener, config.server.graceful_conn_close_deadline);

    let binding: Arc<dyn ChallengeBinding> = match config.binding {
        BindingKind::Store => Arc::new(StoreBinding::new(
            Cache::new(config.pow.expired_duration).context("challenge store")?,
        )),
        BindingKind::Token => {
            // Fresh per process: outstanding tokens do not survive a restart.
            let mut secret = [0u8; 32];
            SysRng
                .try_fill_bytes(&mut secret)
                .context("token secret generation")?;
            Arc::new(TokenBinding::new(secret.to_vec()))
        },
    };

    let handler = Arc::new(Handler::new(
        Quotes::new(config.pow.clone()),
        Arc::clone(&binding),
    ));

    {
        let handler = Arc::clone(&handler);
        server.handle_func(Command::Req, move |request, writer| {
            let handler = Arc::clone(&handler);
            async move { handler.req_challenge(request, writer).await }
        });
    }

    let get_resource: HandleFunc = {
        let handler = Arc::clone(&handler);
        Arc::new(move |request, writer| {
            let handler = Arc::clone(&handler);
            Box::pin(async move { handler.get_resource(request, writer).await })
                as HandlerFuture
        })
    };
    server.register(Command::Res, pow_middleware(get_resource, binding));

    Ok(server)
}
