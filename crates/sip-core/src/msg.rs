// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::num::ParseIntError;

use smol_str::SmolStr;

use crate::{
    headers::{HeaderName, Headers},
    method::Method,
    status::StatusCode,
};

/// Protocol token that opens every response status line.
pub const SIP_VERSION: &str = "SIP/2.0";

/// Distinguishes requests from responses by their start-line token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Request(Method),
    Response(u16),
}

/// A parsed SIP datagram.
///
/// `start_line_remainder` holds everything after the first space of the
/// start line: `"<request-uri> SIP/2.0"` for requests and
/// `"<code> <reason>"` for responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipMessage {
    pub kind: MessageKind,
    pub start_line_remainder: SmolStr,
    pub headers: Headers,
    pub body: String,
}

impl SipMessage {
    /// Creates a request with the given target and no headers.
    pub fn request(method: Method, target: &str) -> Self {
        Self {
            kind: MessageKind::Request(method),
            start_line_remainder: SmolStr::new(format!("{} {}", target, SIP_VERSION)),
            headers: Headers::new(),
            body: String::new(),
        }
    }

    /// Creates a response carrying the table reason phrase for `status`.
    pub fn response(status: StatusCode) -> Self {
        Self {
            kind: MessageKind::Response(status.as_u16()),
            start_line_remainder: SmolStr::new(format!("{} {}", status.as_u16(), status.reason())),
            headers: Headers::new(),
            body: String::new(),
        }
    }

    pub fn method(&self) -> Option<&Method> {
        match &self.kind {
            MessageKind::Request(method) => Some(method),
            MessageKind::Response(_) => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self.kind {
            MessageKind::Response(code) => Some(code),
            MessageKind::Request(_) => None,
        }
    }

    /// Token that opened the start line (method name or `SIP/2.0`).
    pub fn type_token(&self) -> &str {
        match &self.kind {
            MessageKind::Request(method) => method.as_str(),
            MessageKind::Response(_) => SIP_VERSION,
        }
    }

    /// Request-URI of a request (the first word of the remainder).
    pub fn request_uri(&self) -> Option<&str> {
        match self.kind {
            MessageKind::Request(_) => self.start_line_remainder.split_whitespace().next(),
            MessageKind::Response(_) => None,
        }
    }

    pub fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).map(|v| v.as_str())
    }

    pub fn call_id(&self) -> Option<&str> {
        self.header(HeaderName::CallId)
    }

    /// Parsed `CSeq` header, if present and well formed.
    pub fn cseq(&self) -> Option<CSeq> {
        CSeq::parse(self.header(HeaderName::CSeq)?)
    }

    /// Declared `Content-Length`.
    ///
    /// `None` when the header is absent; `Some(Err(_))` when it is not a
    /// number, which callers treat as a protocol violation.
    pub fn content_length(&self) -> Option<Result<usize, ParseIntError>> {
        self.header(HeaderName::ContentLength)
            .map(|v| v.trim().parse::<usize>())
    }
}

/// The `CSeq` header: sequence number plus the method it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CSeq {
    pub number: u32,
    pub method: Method,
}

impl CSeq {
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split_whitespace();
        let number = parts.next()?.parse::<u32>().ok()?;
        let method = Method::from_token(parts.next()?);
        Some(Self { number, method })
    }

    /// Same sequence number, answering `method`.
    pub fn for_method(&self, method: Method) -> Self {
        Self {
            number: self.number,
            method,
        }
    }
}

impl std::fmt::Display for CSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.number, self.method)
    }
}
