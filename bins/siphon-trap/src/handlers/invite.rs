// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// INVITE request handler.
///
/// Checks run in this order:
/// 1. Mandatory headers (To, From, Call-ID, CSeq, Contact)
/// 2. Content-Type / Accept / Content-Length against the SDP body
/// 3. Known Call-ID means a retransmission; it is logged and nothing else
/// 4. Digest authentication, when enabled
/// 5. SDP offer parsing and session construction
use async_trait::async_trait;
use sip_core::{HeaderName, Method, SipMessage};
use smol_str::SmolStr;
use tracing::{debug, info};

use super::{require_call_id, RequestHandler};
use crate::{
    error::{CallError, Violation},
    services::ServiceRegistry,
    session::{CallSession, SessionTable},
    transport::{cseq_number, TransportContext},
};

const MANDATORY: [HeaderName; 5] = [
    HeaderName::To,
    HeaderName::From,
    HeaderName::CallId,
    HeaderName::CSeq,
    HeaderName::Contact,
];

const SDP: &str = "application/sdp";

pub struct InviteHandler;

impl InviteHandler {
    pub fn new() -> Self {
        Self
    }

    fn check_headers(request: &SipMessage) -> Result<(), Violation> {
        if let Some(missing) = MANDATORY
            .iter()
            .find(|name| !request.headers.contains(**name))
        {
            return Err(Violation::MissingHeader(*missing));
        }
        if request.cseq().is_none() {
            return Err(Violation::InvalidCSeq(SmolStr::new(
                request.header(HeaderName::CSeq).unwrap_or_default(),
            )));
        }
        Ok(())
    }

    fn check_content(request: &SipMessage) -> Result<(), Violation> {
        let content_type = request
            .header(HeaderName::ContentType)
            .ok_or(Violation::MissingHeader(HeaderName::ContentType))?;
        if !media_type_is(content_type, SDP) {
            return Err(Violation::UnsupportedContentType(SmolStr::new(content_type)));
        }

        if let Some(accept) = request.header(HeaderName::Accept) {
            if !accepts_sdp(accept) {
                return Err(Violation::NotAcceptable(SmolStr::new(accept)));
            }
        }

        match request.content_length() {
            Some(Err(_)) => {
                return Err(Violation::InvalidContentLength(SmolStr::new(
                    request.header(HeaderName::ContentLength).unwrap_or_default(),
                )))
            }
            Some(Ok(0)) if !request.body.is_empty() => return Err(Violation::UndeclaredBody),
            _ => {}
        }
        if request.body.is_empty() {
            return Err(Violation::MissingBody);
        }
        Ok(())
    }

    fn authenticate(request: &SipMessage, services: &ServiceRegistry) -> Result<(), CallError> {
        let Some(authenticator) = &services.authenticator else {
            return Ok(());
        };
        let authorization = request
            .header(HeaderName::Authorization)
            .ok_or(CallError::Authentication(None))?;
        let credentials = authenticator
            .verify(authorization, &Method::Invite)
            .map_err(|e| CallError::Authentication(Some(e)))?;
        info!(
            call_id = request.call_id().unwrap_or_default(),
            username = %credentials.username,
            "digest credentials accepted"
        );
        Ok(())
    }
}

/// `type/subtype` comparison ignoring parameters and case.
fn media_type_is(value: &str, expected: &str) -> bool {
    value
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|media| media.eq_ignore_ascii_case(expected))
}

fn accepts_sdp(accept: &str) -> bool {
    accept.split(',').any(|range| {
        media_type_is(range, SDP) || media_type_is(range, "application/*") || media_type_is(range, "*/*")
    })
}

#[async_trait]
impl RequestHandler for InviteHandler {
    async fn handle(
        &self,
        request: &SipMessage,
        ctx: &TransportContext,
        services: &ServiceRegistry,
        sessions: &mut SessionTable,
    ) -> Result<(), CallError> {
        Self::check_headers(request)?;
        Self::check_content(request)?;

        let call_id = require_call_id(request)?;
        if let Some(existing) = sessions.get(call_id) {
            info!(
                call_id,
                peer = %ctx.peer,
                cseq = ?cseq_number(request),
                state = ?existing.state,
                "INVITE retransmission ignored"
            );
            return Ok(());
        }

        Self::authenticate(request, services)?;

        let offer = sip_sdp::parse(&request.body)?;
        debug!(call_id, media_blocks = offer.media.len(), "SDP offer parsed");

        let session = CallSession::establish(request, &offer, ctx, services).await?;
        sessions.insert(session);
        Ok(())
    }

    fn method(&self) -> Method {
        Method::Invite
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use crate::test_support::{invite_with_sdp, registry, RecordingEndpoint};
    use sip_auth::compute_expected;
    use sip_parse::parse_message;

    fn ctx() -> TransportContext {
        TransportContext {
            peer: "127.0.0.1:40000".parse().unwrap(),
        }
    }

    async fn run(
        raw: &str,
        services: &ServiceRegistry,
        sessions: &mut SessionTable,
    ) -> Result<(), CallError> {
        let request = parse_message(raw.as_bytes()).unwrap();
        InviteHandler::new()
            .handle(&request, &ctx(), services, sessions)
            .await
    }

    #[test]
    fn content_type_matching() {
        assert!(media_type_is("application/sdp", SDP));
        assert!(media_type_is("Application/SDP; charset=utf-8", SDP));
        assert!(!media_type_is("text/plain", SDP));
        assert!(accepts_sdp("text/html, application/sdp"));
        assert!(accepts_sdp("*/*"));
        assert!(!accepts_sdp("text/html"));
    }

    #[tokio::test]
    async fn accepts_call_without_auth() {
        let (services, endpoint) = registry(RecordingEndpoint::new(), false);
        let mut sessions = SessionTable::new();

        run(&invite_with_sdp("inv-1", None), &services, &mut sessions)
            .await
            .unwrap();

        let session = sessions.get("inv-1").unwrap();
        assert_eq!(session.state, SessionState::Setup);
        let codes: Vec<_> = endpoint
            .messages()
            .iter()
            .map(|m| m.status_code().unwrap())
            .collect();
        assert_eq!(codes, vec![180, 200]);
    }

    #[tokio::test]
    async fn retransmission_is_logged_only() {
        let (services, endpoint) = registry(RecordingEndpoint::new(), false);
        let mut sessions = SessionTable::new();
        let invite = invite_with_sdp("inv-2", None);

        run(&invite, &services, &mut sessions).await.unwrap();
        run(&invite, &services, &mut sessions).await.unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(endpoint.sent().len(), 2);
    }

    #[tokio::test]
    async fn missing_contact_is_a_violation() {
        let (services, endpoint) = registry(RecordingEndpoint::new(), false);
        let mut sessions = SessionTable::new();
        let invite = invite_with_sdp("inv-3", None).replace("Contact: <sip:scanner@127.0.0.1:40000>\r\n", "");

        let err = run(&invite, &services, &mut sessions).await.unwrap_err();
        assert!(matches!(
            err,
            CallError::ProtocolViolation(Violation::MissingHeader(HeaderName::Contact))
        ));
        assert!(sessions.is_empty());
        assert!(endpoint.sent().is_empty());
    }

    #[tokio::test]
    async fn wrong_content_type_is_rejected() {
        let (services, _endpoint) = registry(RecordingEndpoint::new(), false);
        let mut sessions = SessionTable::new();
        let invite = invite_with_sdp("inv-4", None).replace("application/sdp", "text/plain");

        let err = run(&invite, &services, &mut sessions).await.unwrap_err();
        assert!(matches!(
            err,
            CallError::ProtocolViolation(Violation::UnsupportedContentType(_))
        ));
    }

    #[tokio::test]
    async fn accept_without_sdp_is_rejected() {
        let (services, _endpoint) = registry(RecordingEndpoint::new(), false);
        let mut sessions = SessionTable::new();
        let invite = invite_with_sdp("inv-5", None)
            .replace("Max-Forwards: 70\r\n", "Max-Forwards: 70\r\nAccept: text/html\r\n");

        let err = run(&invite, &services, &mut sessions).await.unwrap_err();
        assert!(matches!(
            err,
            CallError::ProtocolViolation(Violation::NotAcceptable(_))
        ));
    }

    #[tokio::test]
    async fn zero_length_with_body_is_rejected() {
        let (services, _endpoint) = registry(RecordingEndpoint::new(), false);
        let mut sessions = SessionTable::new();
        let invite = invite_with_sdp("inv-6", None);
        let declared = format!("Content-Length: {}", crate::test_support::OFFER.len());
        let invite = invite.replace(&declared, "Content-Length: 0");

        let err = run(&invite, &services, &mut sessions).await.unwrap_err();
        assert!(matches!(
            err,
            CallError::ProtocolViolation(Violation::UndeclaredBody)
        ));
    }

    #[tokio::test]
    async fn missing_credentials_require_authentication() {
        let (services, endpoint) = registry(RecordingEndpoint::new(), true);
        let mut sessions = SessionTable::new();

        let err = run(&invite_with_sdp("inv-7", None), &services, &mut sessions)
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Authentication(None)));
        assert!(sessions.is_empty());
        assert!(endpoint.sent().is_empty());
    }

    #[tokio::test]
    async fn wrong_digest_is_rejected_and_right_one_accepted() {
        let (services, _endpoint) = registry(RecordingEndpoint::new(), true);
        let mut sessions = SessionTable::new();
        let realm = services.config.realm();
        let uri = "sip:100@127.0.0.1";
        let nonce = "0123456789abcdef";

        let bad = format!(
            r#"Digest username="scanner", realm="{realm}", nonce="{nonce}", uri="{uri}", response="00000000000000000000000000000000""#
        );
        let err = run(&invite_with_sdp("inv-8", Some(&bad)), &services, &mut sessions)
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Authentication(Some(_))));

        let response = compute_expected(
            "scanner",
            &realm,
            &services.config.secret,
            nonce,
            "INVITE",
            uri,
        );
        let good = format!(
            r#"Digest username="scanner", realm="{realm}", nonce="{nonce}", uri="{uri}", response="{response}""#
        );
        run(&invite_with_sdp("inv-8", Some(&good)), &services, &mut sessions)
            .await
            .unwrap();
        assert!(sessions.contains("inv-8"));
    }
}
