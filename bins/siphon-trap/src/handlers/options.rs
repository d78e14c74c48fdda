// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// OPTIONS request handler.
///
/// Scanners ping with OPTIONS before anything else, so the answer looks like
/// an ordinary softphone: 200 OK with Allow and Accept. No state is kept.
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

pub const ALLOW: &str = "INVITE, ACK, CANCEL, OPTIONS, BYE";
pub const ACCEPT: &str = "application/sdp";

pub struct OptionsHandler;

impl OptionsHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RequestHandler for OptionsHandler {
    async fn handle(
        &self,
        request: &SipMessage,
        ctx: &TransportContext,
        services: &ServiceRegistry,
        _sessions: &mut SessionTable,
    ) -> Result<(), CallError> {
        let mut response = response_for(request, StatusCode::OK, &generate_tag(), services);
        response.headers.insert(HeaderName::Allow, ALLOW);
        response.headers.insert(HeaderName::Accept, ACCEPT);

        services.send(&response, ctx.peer).await?;
        info!(
            peer = %ctx.peer,
            call_id = request.call_id().unwrap_or_default(),
            user_agent = request.header(HeaderName::UserAgent).unwrap_or_default(),
            "OPTIONS ping answered"
        );
        Ok(())
    }

    fn method(&self) -> Method {
        Method::Options
    }
}
