// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Request handler trait and method-specific handlers.
use async_trait::async_trait;
use sip_core::{HeaderName, Method, SipMessage};

use crate::{
    error::{CallError, Violation},
    services::ServiceRegistry,
    session::SessionTable,
    transport::TransportContext,
};

pub mod ack;
pub mod bye;
pub mod cancel;
pub mod invite;
pub mod options;
pub mod register;

/// Trait for handling SIP request methods.
///
/// Each handler is responsible for:
/// 1. Validating the request against the honeypot's dialect
/// 2. Creating, advancing or removing the call session
/// 3. Sending responses through the service registry
///
/// Handlers never answer errors themselves; they return a [`CallError`] and
/// the dispatcher decides whether the peer gets a challenge or silence.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handle an incoming SIP request.
    ///
    /// # Arguments
    /// * `request` - The parsed request
    /// * `ctx` - Where the datagram came from
    /// * `services` - Shared service registry
    /// * `sessions` - Live calls, owned by the dispatcher
    async fn handle(
        &self,
        request: &SipMessage,
        ctx: &TransportContext,
        services: &ServiceRegistry,
        sessions: &mut SessionTable,
    ) -> Result<(), CallError>;

    /// Returns the SIP method this handler is responsible for.
    fn method(&self) -> Method;
}

/// Call-ID of `request`, which every session-bound method needs.
pub(crate) fn require_call_id(request: &SipMessage) -> Result<&str, CallError> {
    request
        .call_id()
        .ok_or(CallError::ProtocolViolation(Violation::MissingHeader(
            HeaderName::CallId,
        )))
}
