// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Honeypot configuration.
///
/// Values come from three layers, later ones winning: built-in defaults, an
/// optional JSON file, then command-line flags / environment variables.
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_USER: &str = "100";
pub const DEFAULT_USER_AGENT: &str = "softphone";
pub const DEFAULT_SECRET: &str = "45GTY9F3";
pub const DEFAULT_CAPTURE_DIR: &str = "captures";

/// Immutable runtime configuration shared through the service registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HoneypotConfig {
    /// SIP listen address (UDP)
    pub bind: SocketAddr,

    /// Local SIP user the honeypot pretends to be
    pub user: String,

    /// Address placed in Contact and SDP; defaults to the bound address
    pub advertised_ip: Option<IpAddr>,

    /// Port placed in Contact; defaults to the bound port
    pub advertised_port: Option<u16>,

    pub user_agent: String,

    /// Shared digest secret accepted for every username
    pub secret: String,

    /// Challenge INVITEs with 401 before accepting them
    pub auth_enabled: bool,

    /// Digest realm; defaults to `<user>@localhost`
    pub realm: Option<String>,

    /// Directory receiving RTP capture artifacts
    pub capture_dir: PathBuf,

    /// Interface the per-call RTP sockets bind to
    pub rtp_bind: IpAddr,
}

impl Default for HoneypotConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 5060),
            user: DEFAULT_USER.to_owned(),
            advertised_ip: None,
            advertised_port: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            secret: DEFAULT_SECRET.to_owned(),
            auth_enabled: false,
            realm: None,
            capture_dir: PathBuf::from(DEFAULT_CAPTURE_DIR),
            rtp_bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

impl HoneypotConfig {
    /// Reads a JSON config file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn realm(&self) -> String {
        self.realm
            .clone()
            .unwrap_or_else(|| format!("{}@localhost", self.user))
    }

    /// Address advertised to peers, given where the SIP socket actually bound.
    ///
    /// A wildcard bind cannot be advertised, so it falls back to loopback
    /// unless `advertised_ip` is set.
    pub fn advertised_addr(&self, bound: SocketAddr) -> SocketAddr {
        let ip = self.advertised_ip.unwrap_or_else(|| {
            if bound.ip().is_unspecified() {
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            } else {
                bound.ip()
            }
        });
        SocketAddr::new(ip, self.advertised_port.unwrap_or(bound.port()))
    }
}
