// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// CANCEL request handler.
///
/// Only a call still in setup can be cancelled, and only by a CANCEL whose
/// CSeq names the INVITE transaction that created it. Its capture channel is
/// released (no artifact exists unless media already arrived) and the
/// CANCEL is answered with 200 OK. A CANCEL for an acknowledged call is
/// logged and dropped; the caller has to send BYE.
use async_trait::async_trait;
use sip_core::{Method, SipMessage, StatusCode};
use smol_str::SmolStr;
use tracing::{info, warn};

use super::{require_call_id, RequestHandler};
use crate::{
    error::CallError,
    services::ServiceRegistry,
    session::{SessionState, SessionTable},
    transport::TransportContext,
};

pub struct CancelHandler;

impl CancelHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RequestHandler for CancelHandler {
    async fn handle(
        &self,
        request: &SipMessage,
        ctx: &TransportContext,
        services: &ServiceRegistry,
        sessions: &mut SessionTable,
    ) -> Result<(), CallError> {
        let call_id = require_call_id(request)?;
        let session = sessions.lookup_mut(call_id)?;
        let cseq = request.cseq();
        if !cseq.as_ref().is_some_and(|c| session.matches_invite(c)) {
            warn!(
                call_id,
                peer = %ctx.peer,
                cseq = ?cseq,
                invite_cseq = session.invite_cseq,
                "CANCEL does not match the INVITE transaction"
            );
            return Err(CallError::SessionLookup(SmolStr::new(call_id)));
        }
        let state = session.state;
        if state != SessionState::Setup {
            warn!(call_id, peer = %ctx.peer, ?state, "CANCEL after setup ignored");
            return Ok(());
        }

        let Some(mut session) = sessions.remove(call_id) else {
            return Ok(());
        };
        let stats = session.terminate().await;
        info!(
            call_id,
            peer = %ctx.peer,
            packets = stats.packets,
            artifact = ?stats.path,
            "call cancelled"
        );

        let response = session.reply(request, StatusCode::OK, services);
        services.send(&response, ctx.peer).await
    }

    fn method(&self) -> Method {
        Method::Cancel
    }
}
