// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{future::Future, net::SocketAddr, pin::Pin, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use dashmap::DashMap;
use tokio::{
    net::{TcpListener, TcpStream},
    time::sleep,
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, error};

use crate::proto::{Command, Request, connection::ResponseWriter};

pub const ERR_UNKNOWN_COMMAND: &str = "unknown command";
pub const ERR_INTERNAL_SERVER: &str = "internal server error";

pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
/// One entry of the dispatch table. Handlers receive the request and a
/// writer able to emit any outbound frame on the same connection.
pub type HandleFunc =
    Arc<dyn Fn(Request, Arc<ResponseWriter>) -> HandlerFuture + Send + Sync>;

/// Accepts connections and runs one reader task per client until the
/// cancellation scope closes.
pub struct Server {
    listener: TcpListener,
    conn_deadline: Duration,
    handlers: Arc<DashMap<Command, HandleFunc>>,
}

impl Server {
    pub fn new(listener: TcpListener, conn_deadline: Duration) -> Self {
        Self {
            listener,
            conn_deadline,
            handlers: Arc::new(DashMap::new()),
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("listener local addr")
    }

    /// Registers `f` for `cmd`, replacing any previous handler.
    pub fn handle_func<F, Fut>(&self, cmd: Command, f: F)
    where
        F: Fn(Request, Arc<ResponseWriter>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register(cmd, Arc::new(move |request, writer| {
            Box::pin(f(request, writer)) as HandlerFuture
        }));
    }

    /// Registers an already-boxed handler, e.g. one wrapped by middleware.
    pub fn register(&self, cmd: Command, handler: HandleFunc) {
        self.handlers.insert(cmd, handler);
    }

    /// Accept loop. On cancellation it stops accepting, grants every live
    /// connection the configured drain deadline, and returns once all
    /// per-connection tasks have exited.
    pub async fn serve(&self, cancel: CancellationToken) -> Result<()> {
        debug!("serve: started");

        let tracker = TaskTracker::new();

        loop {
            let (stream, peer) = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("serve: context closed, shutting down");
                    break;
                },
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        error!("accept conn: {err}");
                        continue;
                    },
                },
            };

            let handlers = Arc::clone(&self.handlers);
            let token = cancel.child_token();
            let deadline = self.conn_deadline;
            tracker.spawn(async move {
                read_conn(handlers, stream, peer, token, deadline).await;
            });
        }

        tracker.close();
        tracker.wait().await;
        debug!("serve: serving stopped");

        Ok(())
    }
}

/// Per-connection reader. Spawns the frame scanner, stamps each request with
/// the client identity, and walks the OPEN -> CLOSING -> CLOSED transitions.
async fn read_conn(
    handlers: Arc<DashMap<Command, HandleFunc>>,
    stream: TcpStream,
    peer: SocketAddr,
    cancel: CancellationToken,
    grace: Duration,
) {
    debug!("client {peer} connected");

    let rw = Arc::new(ResponseWriter::new(stream));
    let scope = cancel.child_token();

    let Some(mut inbound) = rw.take_inbound().await else {
        error!("client {peer}: inbound side already taken");
        return;
    };

    {
        let rw = Arc::clone(&rw);
        let scope = scope.clone();
        tokio::spawn(async move {
            if let Err(err) = rw.read_all(scope).await {
                error!("read_all: {err}");
            }
        });
    }

    // Force-close path for server shutdown only: the socket gets the grace
    // deadline to let an in-flight handler finish writing, then it is forced
    // shut. A connection that finishes on its own cancels just `scope` and
    // the watcher exits without arming the deadline.
    {
        let rw = Arc::clone(&rw);
        let cancel = cancel.clone();
        let scope = scope.clone();
        tokio::spawn(async move {
            tokio::select! {
                // `scope` is a child of `cancel`, so on shutdown both fire;
                // check the parent first.
                biased;
                _ = cancel.cancelled() => {
                    if !rw.is_closed() {
                        sleep(grace).await;
                        if let Err(err) = rw.close().await {
                            error!("conn force close: {err}");
                        }
                    }
                },
                _ = scope.cancelled() => {},
            }
        });
    }

    let subject = peer.to_string().replace(':', "@");

    while let Some(request) = inbound.recv().await {
        let request = request.with_subject(subject.clone());

        match request.cmd.clone() {
            Command::Disc => {
                if let Err(err) = rw.send_ok().await {
                    error!("send ok: {err}");
                }
                break;
            },
            Command::Unknown(raw) => {
                debug!("client {peer}: unknown command {raw:?}");
                if let Err(err) = rw.send_err(ERR_UNKNOWN_COMMAND).await {
                    error!("send err: {err}");
                }
            },
            cmd => dispatch(&handlers, cmd, request, Arc::clone(&rw)).await,
        }
    }

    scope.cancel();
    if let Err(err) = rw.close().await {
        error!("close conn: {err}");
    }

    debug!("client {peer} disconnected");
}

async fn dispatch(
    handlers: &DashMap<Command, HandleFunc>,
    cmd: Command,
    request: Request,
    rw: Arc<ResponseWriter>,
) {
    let Some(handler) = handlers.get(&cmd).map(|entry| entry.value().clone()) else {
        if let Err(err) = rw.send_err(ERR_INTERNAL_SERVER).await {
            error!("send err: {err}");
        }
        return;
    };

    // The handler runs on its own task so a panic is contained there and the
    // connection stays open.
    if let Err(err) = tokio::spawn(handler(request, rw)).await {
        error!("handler failed: {err}");
    }
}
