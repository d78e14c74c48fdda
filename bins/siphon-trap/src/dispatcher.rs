// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Routes each inbound datagram to a method handler and turns handler errors
/// into actions.
///
/// The dispatcher owns the session table outright; packets are handled one
/// at a time, so handlers get `&mut SessionTable` without any locking.
use std::{collections::HashMap, sync::Arc};

use sip_core::{HeaderName, MessageKind, Method, SipMessage, StatusCode};
use sip_parse::parse_message;
use sip_transport::InboundPacket;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::CallError,
    handlers::{
        ack::AckHandler, bye::ByeHandler, cancel::CancelHandler, invite::InviteHandler,
        options::OptionsHandler, register::RegisterHandler, RequestHandler,
    },
    services::ServiceRegistry,
    session::SessionTable,
    transport::{cseq_number, generate_tag, response_for, TransportContext},
};

pub struct Dispatcher {
    handlers: HashMap<Method, Arc<dyn RequestHandler>>,
    services: Arc<ServiceRegistry>,
    sessions: SessionTable,
}

impl Dispatcher {
    /// Create a dispatcher with every supported method registered.
    pub fn new(services: Arc<ServiceRegistry>) -> Self {
        let handlers: [Arc<dyn RequestHandler>; 6] = [
            Arc::new(OptionsHandler::new()),
            Arc::new(InviteHandler::new()),
            Arc::new(AckHandler::new()),
            Arc::new(ByeHandler::new()),
            Arc::new(CancelHandler::new()),
            Arc::new(RegisterHandler::new()),
        ];
        let handlers = handlers
            .into_iter()
            .map(|handler| (handler.method(), handler))
            .collect();

        Self {
            handlers,
            services,
            sessions: SessionTable::new(),
        }
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }

    /// Processes a single datagram. Never fails: every problem is logged and
    /// at most answered with a challenge.
    #[instrument(name = "handle_packet", skip(self, packet), fields(peer = %packet.peer, len = packet.payload.len()))]
    pub async fn handle_packet(&mut self, packet: InboundPacket) {
        let ctx = TransportContext { peer: packet.peer };
        let message = match parse_message(&packet.payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "dropping unparsable datagram");
                return;
            }
        };

        let method = match &message.kind {
            MessageKind::Response(code) => {
                info!(
                    code,
                    call_id = message.call_id().unwrap_or_default(),
                    "ignoring SIP response"
                );
                return;
            }
            MessageKind::Request(method) => method.clone(),
        };

        let Some(handler) = self.handlers.get(&method).cloned() else {
            warn!(
                method = %method,
                call_id = message.call_id().unwrap_or_default(),
                "dropping request with unsupported method"
            );
            return;
        };

        debug!(method = %method, cseq = ?cseq_number(&message), "dispatching");
        if let Err(e) = handler
            .handle(&message, &ctx, &self.services, &mut self.sessions)
            .await
        {
            self.on_error(&message, &method, &ctx, e).await;
        }
    }

    async fn on_error(
        &self,
        request: &SipMessage,
        method: &Method,
        ctx: &TransportContext,
        err: CallError,
    ) {
        let call_id = request.call_id().unwrap_or_default();
        match err {
            CallError::Authentication(reason) => {
                info!(
                    call_id,
                    method = %method,
                    reason = %reason.map_or_else(|| "no credentials".to_owned(), |e| e.to_string()),
                    "challenging request"
                );
                self.send_challenge(request, ctx).await;
            }
            CallError::ProtocolViolation(violation) => {
                warn!(call_id, method = %method, %violation, "protocol violation; dropped");
            }
            CallError::SessionLookup(id) => {
                info!(call_id = %id, method = %method, "no session for request; dropped");
            }
            CallError::Transport(e) => {
                error!(call_id, method = %method, error = %e, "transport failure");
            }
        }
    }

    async fn send_challenge(&self, request: &SipMessage, ctx: &TransportContext) {
        let Some(authenticator) = &self.services.authenticator else {
            warn!("authentication error raised with authentication disabled");
            return;
        };
        let challenge = authenticator.issue_challenge();
        let mut response = response_for(
            request,
            StatusCode::UNAUTHORIZED,
            &generate_tag(),
            &self.services,
        );
        response
            .headers
            .insert(HeaderName::WwwAuthenticate, challenge.header_value());
        if let Err(e) = self.services.send(&response, ctx.peer).await {
            error!(error = %e, "failed to send challenge");
        }
    }

    /// Releases every capture channel so artifacts are flushed to disk.
    pub async fn shutdown(&mut self) {
        let sessions = self.sessions.drain();
        if sessions.is_empty() {
            return;
        }
        info!(count = sessions.len(), "closing open calls");
        for mut session in sessions {
            let stats = session.terminate().await;
            info!(
                call_id = %session.call_id,
                packets = stats.packets,
                bytes = stats.bytes,
                artifact = ?stats.path,
                "capture closed on shutdown"
            );
        }
    }
}
