// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// REGISTER request handler.
///
/// A decoy registrar: every REGISTER succeeds, the binding is echoed back
/// and nothing is stored. Registration sweeps are the most common scanner
/// traffic, so the interesting part is the log line.
use async_trait::async_trait;
use sip_core::{HeaderName, Method, SipMessage, StatusCode};
use tracing::info;

use super::RequestHandler;
use crate::{
    error::CallError,
    services::ServiceRegistry,
    session::SessionTable,
    transport::{generate_tag, response_for, TransportContext},
};

const DEFAULT_EXPIRES: &str = "3600";

pub struct RegisterHandler;

impl RegisterHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RequestHandler for RegisterHandler {
    async fn handle(
        &self,
        request: &SipMessage,
        ctx: &TransportContext,
        services: &ServiceRegistry,
        _sessions: &mut SessionTable,
    ) -> Result<(), CallError> {
        let mut response = response_for(request, StatusCode::OK, &generate_tag(), services);
        if let Some(contact) = request.header(HeaderName::Contact) {
            response.headers.insert(HeaderName::Contact, contact);
        }
        let expires = request
            .header(HeaderName::Expires)
            .unwrap_or(DEFAULT_EXPIRES);
        response.headers.insert(HeaderName::Expires, expires);

        info!(
            peer = %ctx.peer,
            aor = request.header(HeaderName::To).unwrap_or_default(),
            contact = request.header(HeaderName::Contact).unwrap_or_default(),
            expires,
            has_credentials = request.headers.contains(HeaderName::Authorization),
            "REGISTER accepted (decoy)"
        );
        services.send(&response, ctx.peer).await
    }

    fn method(&self) -> Method {
        Method::Register
    }
}
