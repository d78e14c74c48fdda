// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line-oriented SIP message parser and serializer.
//!
//! The dialect is deliberately small: one message per datagram, no header
//! folding, and a closed header whitelist. Anything outside it fails with a
//! [`ParseError`] that the dispatcher logs before dropping the datagram.

use std::fmt::Write;

use sip_core::{HeaderName, Headers, MessageKind, Method, SipMessage, SIP_VERSION};
use smol_str::SmolStr;
use thiserror::Error;

/// Reasons a datagram is rejected by [`parse_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("message is empty")]
    MessageTooShort,
    #[error("malformed start line: {0:?}")]
    MalformedStartLine(String),
    #[error("malformed header line: {0:?}")]
    MalformedHeaderLine(String),
    #[error("header not accepted: {0:?}")]
    UnknownHeader(String),
}

/// Parses one SIP message from raw datagram bytes.
///
/// Invalid UTF-8 is replaced rather than rejected; scanners routinely send
/// junk and the text is only ever logged or echoed.
pub fn parse_message(raw: &[u8]) -> Result<SipMessage, ParseError> {
    let text = String::from_utf8_lossy(raw);
    let normalized = normalize_line_endings(&text);
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return Err(ParseError::MessageTooShort);
    }

    let (head, body) = split_head_body(trimmed);
    let mut lines = head.split('\n');
    let start = lines.next().unwrap_or_default().trim();
    let (kind, remainder) = parse_start_line(start)?;

    let mut headers = Headers::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (name, value) = parse_header_line(line)?;
        headers.insert(name, value);
    }

    Ok(SipMessage {
        kind,
        start_line_remainder: SmolStr::new(remainder),
        headers,
        body: body.to_owned(),
    })
}

/// Renders a message for the wire.
///
/// Headers are written in long display form in stored order, one `Via` line
/// per entry, and the body follows the blank line untouched.
pub fn serialize_message(msg: &SipMessage) -> String {
    let mut buf = String::new();
    let _ = write!(
        buf,
        "{} {}\r\n",
        msg.type_token(),
        msg.start_line_remainder
    );
    for header in msg.headers.iter() {
        let _ = write!(
            buf,
            "{}: {}\r\n",
            header.name.display_name(),
            header.value.trim()
        );
    }
    buf.push_str("\r\n");
    buf.push_str(&msg.body);
    buf
}

/// Folds CRLF and stray LFCR pairs into single `\n` terminators.
fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace("\n\r", "\n")
}

/// Splits at the first blank line; the body is empty when there is none.
fn split_head_body(text: &str) -> (&str, &str) {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if offset > 0 && line.trim().is_empty() {
            return (&text[..offset], &text[offset + line.len()..]);
        }
        offset += line.len();
    }
    (text, "")
}

fn parse_start_line(line: &str) -> Result<(MessageKind, &str), ParseError> {
    let malformed = || ParseError::MalformedStartLine(line.to_owned());
    let (token, remainder) = line.split_once(' ').ok_or_else(malformed)?;
    if token.len() < 3 {
        return Err(malformed());
    }
    let remainder = remainder.trim();

    if token == SIP_VERSION {
        let code = remainder
            .get(..3)
            .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u16>().ok())
            .ok_or_else(malformed)?;
        return Ok((MessageKind::Response(code), remainder));
    }

    Ok((MessageKind::Request(Method::from_token(token)), remainder))
}

fn parse_header_line(line: &str) -> Result<(HeaderName, &str), ParseError> {
    match line.find(':') {
        Some(pos) if pos >= 1 => {
            let identifier = line[..pos].trim();
            let name = HeaderName::parse(identifier)
                .ok_or_else(|| ParseError::UnknownHeader(identifier.to_owned()))?;
            Ok((name, line[pos + 1..].trim()))
        }
        _ => Err(ParseError::MalformedHeaderLine(line.to_owned())),
    }
}
