// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::{PoisonError, RwLock};

use anyhow::{Context, Result, bail};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{Mutex, mpsc},
};
use tokio_util::sync::CancellationToken;

use crate::proto::{Command, Request, TCP_DELIMITER, codec};

/// Both ends of one protocol connection: a frame scanner feeding an inbound
/// channel, and the send_* helpers for every outbound frame shape.
///
/// The scanner (`read_all`) runs on its own task and owns the read half; the
/// consumer drains the receiver obtained from [`take_inbound`]. Writes are
/// serialised on the write half and refused once the connection is closed.
///
/// [`take_inbound`]: ResponseWriter::take_inbound
#[derive(Debug)]
pub struct ResponseWriter {
    reader: Mutex<Option<BufReader<OwnedReadHalf>>>,
    writer: Mutex<OwnedWriteHalf>,
    inbound_tx: Mutex<Option<mpsc::Sender<Request>>>,
    inbound_rx: Mutex<Option<mpsc::Receiver<Request>>>,
    closed: RwLock<bool>,
}

impl ResponseWriter {
    pub fn new(stream: TcpStream) -> Self {
        let (r, w) = stream.into_split();
        let (tx, rx) = mpsc::channel(1);

        Self {
            reader: Mutex::new(Some(BufReader::new(r))),
            writer: Mutex::new(w),
            inbound_tx: Mutex::new(Some(tx)),
            inbound_rx: Mutex::new(Some(rx)),
            closed: RwLock::new(false),
        }
    }

    /// Hands out the inbound side once. Subsequent calls return `None`.
    pub async fn take_inbound(&self) -> Option<mpsc::Receiver<Request>> {
        self.inbound_rx.lock().await.take()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the connection closed and half-closes the write side. Pending
    /// inbound frames may still be drained; further writes are refused.
    pub async fn close(&self) -> Result<()> {
        {
            let mut closed = self.closed.write().unwrap_or_else(PoisonError::into_inner);
            if *closed {
                return Ok(());
            }
            *closed = true;
        }

        let mut w = self.writer.lock().await;
        // The peer may already be gone.
        let _ = w.shutdown().await;

        Ok(())
    }

    /// Scanner loop: accumulates bytes up to each `\r`, parses, and emits
    /// requests on the inbound channel. Returns on EOF or cancellation,
    /// closing the channel either way. A parse error is answered with an
    /// `ERR` frame and the stream continues; only a failure to send that
    /// reply tears the loop down.
    pub async fn read_all(&self, cancel: CancellationToken) -> Result<()> {
        let Some(mut reader) = self.reader.lock().await.take() else {
            bail!("scanner already running");
        };
        let Some(tx) = self.inbound_tx.lock().await.take() else {
            bail!("scanner already running");
        };

        let mut frame = Vec::with_capacity(256);
        loop {
            frame.clear();

            let read = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                res = reader.read_until(TCP_DELIMITER, &mut frame) => {
                    res.context("read frame")?
                },
            };
            if read == 0 {
                return Ok(());
            }

            match codec::parse_frame(&frame) {
                Ok(request) => {
                    if tx.send(request).await.is_err() {
                        return Ok(());
                    }
                },
                Err(err) => {
                    self.send_err(&err.to_string())
                        .await
                        .context("reply to parse error")?;
                },
            }
        }
    }

    pub async fn send_req(&self) -> Result<()> {
        self.write_frame(&codec::encode_command(&Command::Req)).await
    }

    pub async fn send_ok(&self) -> Result<()> {
        self.write_frame(&codec::encode_command(&Command::Ok)).await
    }

    pub async fn send_disc(&self) -> Result<()> {
        self.write_frame(&codec::encode_command(&Command::Disc)).await
    }

    pub async fn send_res(&self, msg: &str) -> Result<()> {
        self.write_frame(&codec::encode_with_body(&Command::Res, msg.as_bytes()))
            .await
    }

    pub async fn send_rsv(&self, msg: &str) -> Result<()> {
        self.write_frame(&codec::encode_with_body(&Command::Rsv, msg.as_bytes()))
            .await
    }

    pub async fn send_err(&self, msg: &str) -> Result<()> {
        self.write_frame(&codec::encode_with_body(&Command::Err, msg.as_bytes()))
            .await
    }

    async fn write_frame(&self, buf: &[u8]) -> Result<()> {
        if self.is_closed() {
            bail!("connection closed");
        }

        let mut w = self.writer.lock().await;
        w.write_all(buf).await.context("write frame")?;

        Ok(())
    }
}
