// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while handling a request.
//!
//! Handlers return these to the dispatcher, which alone decides whether the
//! peer gets a challenge or nothing at all.

use sip_auth::AuthError;
use sip_core::HeaderName;
use sip_sdp::SdpParseError;
use smol_str::SmolStr;
use thiserror::Error;

/// Ways an INVITE (or in-dialog request) breaks the honeypot's dialect.
#[derive(Debug, Error)]
pub enum Violation {
    #[error("missing {0} header")]
    MissingHeader(HeaderName),
    #[error("unsupported Content-Type {0:?}")]
    UnsupportedContentType(SmolStr),
    #[error("Accept {0:?} does not allow application/sdp")]
    NotAcceptable(SmolStr),
    #[error("malformed CSeq {0:?}")]
    InvalidCSeq(SmolStr),
    #[error("malformed Content-Length {0:?}")]
    InvalidContentLength(SmolStr),
    #[error("Content-Length is 0 but a body was sent")]
    UndeclaredBody,
    #[error("INVITE carries no SDP body")]
    MissingBody,
    #[error("SDP has no audio media block")]
    NoAudioMedia,
    #[error("SDP has no usable origin line")]
    MissingOrigin,
    #[error("SDP parse failed: {0}")]
    Sdp(#[from] SdpParseError),
}

#[derive(Debug, Error)]
pub enum CallError {
    /// Missing or wrong credentials; answered with a fresh challenge.
    #[error("authentication required")]
    Authentication(Option<AuthError>),
    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] Violation),
    #[error("no session for Call-ID {0:?}")]
    SessionLookup(SmolStr),
    #[error("transport failure: {0}")]
    Transport(anyhow::Error),
}

impl From<SdpParseError> for CallError {
    fn from(e: SdpParseError) -> Self {
        CallError::ProtocolViolation(Violation::Sdp(e))
    }
}
