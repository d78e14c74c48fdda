// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use async_trait::async_trait;
use sip_core::{Method, SipMessage};
use tracing::{debug, info};

use super::{require_call_id, RequestHandler};
use crate::{
    error::CallError,
    services::ServiceRegistry,
    session::SessionTable,
    transport::TransportContext,
};

/// ACK completes the fake call setup. Never answered.
pub struct AckHandler;

impl AckHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RequestHandler for AckHandler {
    async fn handle(
        &self,
        request: &SipMessage,
        ctx: &TransportContext,
        _services: &ServiceRegistry,
        sessions: &mut SessionTable,
    ) -> Result<(), CallError> {
        let call_id = require_call_id(request)?;
        let session = sessions.lookup_mut(call_id)?;
        if session.acknowledge() {
            info!(
                call_id,
                peer = %ctx.peer,
                rtp_port = session.capture_port(),
                "call active"
            );
        } else {
            debug!(call_id, state = ?session.state, "ACK retransmission");
        }
        Ok(())
    }

    fn method(&self) -> Method {
        Method::Ack
    }
}
