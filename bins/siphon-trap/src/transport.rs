// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-datagram transport context and response construction.

use std::net::SocketAddr;

use rand::Rng;
use sip_core::{CSeq, HeaderName, SipMessage, StatusCode};
use smol_str::SmolStr;

use crate::services::ServiceRegistry;

const DEFAULT_MAX_FORWARDS: &str = "70";

/// Where a request came from. Responses go back to `peer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportContext {
    pub peer: SocketAddr,
}

/// Random To-tag for responses outside a session.
pub fn generate_tag() -> SmolStr {
    SmolStr::new(format!("{:08x}", rand::thread_rng().gen::<u32>()))
}

/// Appends `;tag=` to a To value unless it already has one.
fn tagged(to: &str, tag: &str) -> String {
    if to.contains(";tag=") {
        to.to_owned()
    } else {
        format!("{};tag={}", to, tag)
    }
}

/// Builds a response echoing the dialog headers of `request`.
///
/// Header order: every Via, Max-Forwards, To (tagged), From, Call-ID, CSeq,
/// Contact, User-Agent, Content-Length. Callers append extras afterwards.
pub fn response_for(
    request: &SipMessage,
    status: StatusCode,
    to_tag: &str,
    services: &ServiceRegistry,
) -> SipMessage {
    let mut response = SipMessage::response(status);
    let headers = &mut response.headers;

    for via in request.headers.via() {
        headers.insert(HeaderName::Via, via.clone());
    }
    headers.insert(
        HeaderName::MaxForwards,
        request
            .header(HeaderName::MaxForwards)
            .unwrap_or(DEFAULT_MAX_FORWARDS),
    );
    headers.insert(
        HeaderName::To,
        tagged(request.header(HeaderName::To).unwrap_or_default(), to_tag),
    );
    headers.insert(
        HeaderName::From,
        request.header(HeaderName::From).unwrap_or_default(),
    );
    headers.insert(HeaderName::CallId, request.call_id().unwrap_or_default());

    let cseq = match (request.cseq(), request.method()) {
        (Some(cseq), Some(method)) => cseq.for_method(method.clone()).to_string(),
        _ => request
            .header(HeaderName::CSeq)
            .unwrap_or_default()
            .to_owned(),
    };
    headers.insert(HeaderName::CSeq, cseq);
    headers.insert(HeaderName::Contact, services.contact());
    headers.insert(HeaderName::UserAgent, services.config.user_agent.as_str());
    headers.insert(HeaderName::ContentLength, "0");
    response
}

/// Attaches a body and updates Content-Type / Content-Length.
pub fn set_body(response: &mut SipMessage, content_type: &str, body: String) {
    response.headers.insert(HeaderName::ContentType, content_type);
    response
        .headers
        .insert(HeaderName::ContentLength, body.len().to_string());
    response.body = body;
}

/// Sequence number of the request, for logging.
pub fn cseq_number(request: &SipMessage) -> Option<u32> {
    request.cseq().map(|CSeq { number, .. }| number)
}
