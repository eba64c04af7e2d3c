// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use bytes::Bytes;
use thiserror::Error;
use tokio::{
    net::TcpStream,
    sync::{Mutex, OnceCell, mpsc},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    hashcash::header::Header,
    proto::{Command, Request, connection::ResponseWriter},
};

pub const ERR_WRONG_ANSWER: &str = "wrong answer";
pub const ERR_WRONG_PAYLOAD: &str = "payload wrong";

/// An ERR frame from the server, carrying the original reply for inspection.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProtocolError {
    pub origin: Request,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: String,
    pub network: String,
}

/// A challenge as announced by the server: the header to solve plus, under
/// the stateless binding, the tag that must be echoed back with the solution.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub token: Option<String>,
    pub header: Header,
}

impl Challenge {
    /// The RES body for a solved header, echoing the tag when one was issued.
    pub fn solution_body(&self, solved: &Header) -> String {
        match &self.token {
            Some(token) => format!("{token}\n{solved}"),
            None => solved.to_string(),
        }
    }
}

/// Client side of the protocol over one persistent connection. The TCP dial
/// happens on the first send; replies are read sequentially from the inbound
/// channel, frames with unknown commands are dropped.
pub struct Client {
    config: Config,
    cancel: CancellationToken,
    conn: OnceCell<Arc<ResponseWriter>>,
    inbound: Mutex<Option<mpsc::Receiver<Request>>>,
}

impl Client {
    pub fn new(config: Config, cancel: CancellationToken) -> Self {
        Self {
            config,
            cancel,
            conn: OnceCell::new(),
            inbound: Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<&Arc<ResponseWriter>> {
        self.conn
            .get_or_try_init(|| async {
                ensure!(
                    self.config.network.starts_with("tcp"),
                    "unsupported network {:?}",
                    self.config.network
                );

                let stream = TcpStream::connect(&self.config.addr)
                    .await
                    .with_context(|| format!("dial {}", self.config.addr))?;
                stream.set_nodelay(true)?;

                let rw = Arc::new(ResponseWriter::new(stream));
                let inbound = rw
                    .take_inbound()
                    .await
                    .context("inbound side already taken")?;
                *self.inbound.lock().await = Some(inbound);

                let reader = Arc::clone(&rw);
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    if let Err(err) = reader.read_all(cancel).await {
                        warn!("read loop exited: {err}");
                    }
                });

                Ok(rw)
            })
            .await
    }

    /// REQ: asks for a challenge and decodes the RSV reply. A body with a
    /// tag line ahead of the header populates `Challenge::token`.
    pub async fn send_req(&self) -> Result<Challenge> {
        let conn = self.connect().await?;
        conn.send_req().await.context("send req")?;

        let reply = self.recv_reply().await?;
        match reply.cmd {
            Command::Rsv => parse_challenge(reply),
            Command::Err => Err(protocol_error(reply).into()),
            _ => Err(wrong_answer(reply).into()),
        }
    }

    /// RES: submits a solution body and returns the resource payload.
    pub async fn send_res(&self, msg: &str) -> Result<Bytes> {
        let conn = self.connect().await?;
        conn.send_res(msg).await.context("send res")?;

        let reply = self.recv_reply().await?;
        match reply.cmd {
            Command::Rsv => Ok(reply.body),
            Command::Err => Err(protocol_error(reply).into()),
            _ => Err(wrong_answer(reply).into()),
        }
    }

    /// DISC: orderly close, acknowledged by OK.
    pub async fn send_disc(&self) -> Result<()> {
        let conn = self.connect().await?;
        conn.send_disc().await.context("send disc")?;

        let reply = self.recv_reply().await?;
        match reply.cmd {
            Command::Ok => Ok(()),
            Command::Err => Err(protocol_error(reply).into()),
            _ => Err(wrong_answer(reply).into()),
        }
    }

    async fn recv_reply(&self) -> Result<Request> {
        let mut guard = self.inbound.lock().await;
        let inbound = guard.as_mut().context("client is not connected")?;

        loop {
            let reply = inbound.recv().await.context("connection closed")?;
            if reply.cmd.is_available() {
                return Ok(reply);
            }

            debug!("dropping frame with unknown command {:?}", reply.cmd);
        }
    }
}

fn parse_challenge(reply: Request) -> Result<Challenge> {
    let (token, header_bytes) = match reply
        .body
        .iter()
        .position(|&b| b == b'\n')
    {
        Some(pos) => (
            Some(String::from_utf8_lossy(&reply.body[..pos]).into_owned()),
            reply.body.slice(pos + 1..),
        ),
        None => (None, reply.body.clone()),
    };

    let text = match std::str::from_utf8(&header_bytes) {
        Ok(text) => text,
        Err(_) => return Err(wrong_payload(reply).into()),
    };
    match Header::parse(text) {
        Ok(header) => Ok(Challenge { token, header }),
        Err(_) => Err(wrong_payload(reply).into()),
    }
}

fn protocol_error(reply: Request) -> ProtocolError {
    let message = String::from_utf8_lossy(&reply.body).into_owned();
    ProtocolError {
        origin: reply,
        message,
    }
}

fn wrong_answer(reply: Request) -> ProtocolError {
    ProtocolError {
        origin: reply,
        message: ERR_WRONG_ANSWER.to_string(),
    }
}

fn wrong_payload(reply: Request) -> ProtocolError {
    ProtocolError {
        origin: reply,
        message: ERR_WRONG_PAYLOAD.to_string(),
    }
}
