// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Builder for the audio answer carried in the honeypot's 200 OK.

use std::fmt;
use std::net::IpAddr;

use smol_str::SmolStr;

use crate::{validate_field, SdpError};

/// Single PCMU audio stream answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpAnswer {
    username: SmolStr,
    session_id: SmolStr,
    address: IpAddr,
    port: u16,
}

impl SdpAnswer {
    /// Creates an answer advertising `address:port` as the media sink.
    pub fn new(username: &str, address: IpAddr, port: u16) -> Result<Self, SdpError> {
        validate_field(username, "username")?;
        Ok(Self {
            username: SmolStr::new(username),
            session_id: SmolStr::new("0"),
            address,
            port,
        })
    }

    /// Sets the origin session id (and version).
    pub fn session_id(mut self, id: &str) -> Result<Self, SdpError> {
        validate_field(id, "session_id")?;
        self.session_id = SmolStr::new(id);
        Ok(self)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Renders the body with CRLF line endings.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SdpAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr_type = match self.address {
            IpAddr::V4(_) => "IP4",
            IpAddr::V6(_) => "IP6",
        };
        write!(f, "v=0\r\n")?;
        write!(
            f,
            "o={} {} {} IN {} {}\r\n",
            self.username, self.session_id, self.session_id, addr_type, self.address
        )?;
        write!(f, "s=\r\n")?;
        write!(f, "c=IN {} {}\r\n", addr_type, self.address)?;
        write!(f, "t=0 0\r\n")?;
        write!(f, "m=audio {} RTP/AVP 0\r\n", self.port)?;
        write!(f, "a=rtpmap:0 PCMU/8000\r\n")
    }
}
