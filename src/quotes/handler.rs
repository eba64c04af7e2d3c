// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use tracing::error;

use crate::{
    proto::{Request, connection::ResponseWriter},
    quotes::{binding::ChallengeBinding, quotes::Quotes},
    server::ERR_INTERNAL_SERVER,
};

const DEFAULT_CLIENT_ADDR: &str = "localhost";

/// Command handlers for the quotation service.
pub struct Handler {
    quotes: Quotes,
    binding: Arc<dyn ChallengeBinding>,
}

impl Handler {
    pub fn new(quotes: Quotes, binding: Arc<dyn ChallengeBinding>) -> Self {
        Self { quotes, binding }
    }

    /// REQ: issue a challenge bound to the requesting client.
    pub async fn req_challenge(&self, request: Request, writer: Arc<ResponseWriter>) {
        let subject = request.subject().unwrap_or(DEFAULT_CLIENT_ADDR);

        let challenge = match self.quotes.make_challenge(subject) {
            Ok(header) => header,
            Err(err) => {
                error!("make_challenge: {err}");
                if let Err(err) = writer.send_err(ERR_INTERNAL_SERVER).await {
                    error!("send err: {err}");
                }
                return;
            },
        };

        let body = match self.binding.issue(&challenge) {
            Ok(body) => body,
            Err(err) => {
                error!("issue challenge: {err}");
                if let Err(err) = writer.send_err(ERR_INTERNAL_SERVER).await {
                    error!("send err: {err}");
                }
                return;
            },
        };

        if let Err(err) = writer.send_rsv(&body).await {
            error!("send rsv: {err}");
        }
    }

    /// RES (behind the PoW middleware): serve the protected resource.
    pub async fn get_resource(&self, _request: Request, writer: Arc<ResponseWriter>) {
        let resource = match self.quotes.get_resource() {
            Ok(text) => text,
            Err(err) => {
                error!("get_resource: {err}");
                if let Err(err) = writer.send_err(ERR_INTERNAL_SERVER).await {
                    error!("send err: {err}");
                }
                return;
            },
        };

        if let Err(err) = writer.send_rsv(&resource).await {
            error!("send rsv: {err}");
        }
    }
}
