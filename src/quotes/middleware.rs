// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use tracing::{debug, error};

use crate::{
    proto::{Request, connection::ResponseWriter},
    quotes::binding::ChallengeBinding,
    server::{HandleFunc, HandlerFuture},
};

/// Wraps `next` so it only runs for requests carrying a valid, fresh,
/// untampered solution to a previously issued challenge. Rejections are
/// answered with an ERR frame and `next` never sees the request.
pub fn pow_middleware(
    next: HandleFunc,
    binding: Arc<dyn ChallengeBinding>,
) -> HandleFunc {
    Arc::new(move |request: Request, writer: Arc<ResponseWriter>| {
        let next = Arc::clone(&next);
        let binding = Arc::clone(&binding);

        Box::pin(async move {
            match binding.admit(&request.body) {
                Ok(header) => {
                    debug!("admitted solution for nonce {}", header.nonce);
                    next(request, writer).await;
                },
                Err(err) => {
                    if let Err(send_err) = writer.send_err(&err.to_string()).await {
                        error!("send err: {send_err}");
                    }
                },
            }
        }) as HandlerFuture
    })
}
