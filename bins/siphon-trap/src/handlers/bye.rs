// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// BYE request handler.
///
/// Ends the call: the capture channel is flushed and closed, the session
/// leaves the table, and the peer gets 200 OK. A BYE for a Call-ID that is
/// not (or no longer) in the table is a lookup error and stays unanswered.
use async_trait::async_trait;
use sip_core::{Method, SipMessage, StatusCode};
use smol_str::SmolStr;
use tracing::info;

use super::{require_call_id, RequestHandler};
use crate::{
    error::CallError,
    services::ServiceRegistry,
    session::SessionTable,
    transport::TransportContext,
};

pub struct ByeHandler;

impl ByeHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RequestHandler for ByeHandler {
    async fn handle(
        &self,
        request: &SipMessage,
        ctx: &TransportContext,
        services: &ServiceRegistry,
        sessions: &mut SessionTable,
    ) -> Result<(), CallError> {
        let call_id = require_call_id(request)?;
        let mut session = sessions
            .remove(call_id)
            .ok_or_else(|| CallError::SessionLookup(SmolStr::new(call_id)))?;

        let previous = session.state;
        let stats = session.terminate().await;
        let duration = chrono::Utc::now() - session.created_at;
        info!(
            call_id,
            peer = %ctx.peer,
            from_state = ?previous,
            packets = stats.packets,
            bytes = stats.bytes,
            rtp_source = ?stats.remote,
            artifact = ?stats.path,
            duration_ms = duration.num_milliseconds(),
            "call ended"
        );

        let response = session.reply(request, StatusCode::OK, services);
        services.send(&response, ctx.peer).await
    }

    fn method(&self) -> Method {
        Method::Bye
    }
}
