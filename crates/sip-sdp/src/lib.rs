// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal SDP (RFC 4566) support for the honeypot.
//!
//! This crate provides:
//! - A tolerant `<type>=<value>` parser that splits session and media blocks
//! - Typed accessors for the few fields the call session needs
//!   (origin, connection address, first audio stream)
//! - The fixed PCMU answer the honeypot sends back in its 200 OK
//!
//! # Example
//! ```
//! use sip_sdp::parse;
//!
//! let offer = parse("v=0\no=alice 1 1 IN IP4 10.0.0.5\nc=IN IP4 10.0.0.5\nm=audio 49170 RTP/AVP 0\n").unwrap();
//! assert_eq!(offer.origin().unwrap().username, "alice");
//! assert_eq!(offer.audio_media().unwrap().port, 49170);
//! ```

pub mod builder;
pub mod parse;

use smol_str::SmolStr;
use std::collections::HashMap;

pub use builder::SdpAnswer;
pub use parse::{parse, SdpParseError};

const MAX_FIELD_LENGTH: usize = 256;

/// Errors raised while building an SDP answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SdpError {
    /// Field contains control characters (CRLF injection)
    #[error("field {field} contains control characters")]
    FieldContainsControlChars { field: &'static str },
    /// Field is empty or too long
    #[error("field {field} must be 1..={max} bytes, got {actual}")]
    FieldLength {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

pub(crate) fn validate_field(value: &str, field: &'static str) -> Result<(), SdpError> {
    if value.is_empty() || value.len() > MAX_FIELD_LENGTH {
        return Err(SdpError::FieldLength {
            field,
            max: MAX_FIELD_LENGTH,
            actual: value.len(),
        });
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(SdpError::FieldContainsControlChars { field });
    }
    Ok(())
}

/// Raw description as `type -> value` maps.
///
/// Keys seen before the first `m=` line land in `session`; each `m=` line
/// starts a new map in `media`. Within a map the last value for a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdpMessage {
    pub session: HashMap<char, SmolStr>,
    pub media: Vec<HashMap<char, SmolStr>>,
}

/// Parsed `o=` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub username: SmolStr,
    pub session_id: SmolStr,
    pub session_version: SmolStr,
    pub net_type: SmolStr,
    pub addr_type: SmolStr,
    pub address: SmolStr,
}

impl Origin {
    /// Parses the six whitespace-separated origin fields.
    pub fn parse(value: &str) -> Option<Self> {
        let fields: Vec<&str> = value.split_whitespace().collect();
        let [username, session_id, session_version, net_type, addr_type, address] =
            fields.as_slice()
        else {
            return None;
        };
        Some(Self {
            username: SmolStr::new(username),
            session_id: SmolStr::new(session_id),
            session_version: SmolStr::new(session_version),
            net_type: SmolStr::new(net_type),
            addr_type: SmolStr::new(addr_type),
            address: SmolStr::new(address),
        })
    }
}

/// The first `m=audio` block of a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioMedia {
    pub port: u16,
    pub protocol: SmolStr,
    pub formats: Vec<SmolStr>,
    /// Media-level `c=` address, falling back to the session-level one.
    pub connection_address: Option<SmolStr>,
}

impl SdpMessage {
    pub fn is_empty(&self) -> bool {
        self.session.is_empty() && self.media.is_empty()
    }

    pub fn session_value(&self, key: char) -> Option<&str> {
        self.session.get(&key).map(|v| v.as_str())
    }

    /// Origin line, when present with all six fields.
    pub fn origin(&self) -> Option<Origin> {
        Origin::parse(self.session_value('o')?)
    }

    /// Address from the session-level `c=IN IP4 <addr>` line.
    pub fn connection_address(&self) -> Option<SmolStr> {
        connection_address(self.session_value('c')?)
    }

    pub fn audio_media(&self) -> Option<AudioMedia> {
        self.media.iter().find_map(|block| {
            let mut fields = block.get(&'m')?.split_whitespace();
            if fields.next()? != "audio" {
                return None;
            }
            // "<port>" or "<port>/<count>"
            let port = fields.next()?.split('/').next()?.parse::<u16>().ok()?;
            let protocol = SmolStr::new(fields.next().unwrap_or_default());
            let formats = fields.map(SmolStr::new).collect();
            let connection_address = block
                .get(&'c')
                .and_then(|c| connection_address(c))
                .or_else(|| self.connection_address());
            Some(AudioMedia {
                port,
                protocol,
                formats,
                connection_address,
            })
        })
    }
}

fn connection_address(value: &str) -> Option<SmolStr> {
    // c=<nettype> <addrtype> <connection-address>[/ttl]
    let address = value.split_whitespace().nth(2)?;
    address.split('/').next().map(SmolStr::new)
}
