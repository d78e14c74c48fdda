// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Shared service registry for handlers.
///
/// Provides access to configuration, the outbound endpoint and the digest
/// engine. Everything here is immutable once the daemon is running.
use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use sip_auth::DigestAuthenticator;
use sip_core::SipMessage;
use sip_parse::serialize_message;
use sip_transport::Endpoint;
use tracing::debug;

use crate::{config::HoneypotConfig, error::CallError};

/// Registry of shared services used by request handlers.
pub struct ServiceRegistry {
    /// Honeypot configuration (immutable)
    pub config: Arc<HoneypotConfig>,

    /// Socket every SIP response leaves through
    pub endpoint: Arc<dyn Endpoint>,

    /// Present only when authentication is enabled
    pub authenticator: Option<DigestAuthenticator>,

    /// Address placed in Contact and the SDP answer
    pub advertised: SocketAddr,
}

impl ServiceRegistry {
    /// Create a new service registry from configuration.
    pub fn new(config: HoneypotConfig, endpoint: Arc<dyn Endpoint>) -> Result<Self> {
        let advertised = config.advertised_addr(endpoint.local_addr()?);
        let authenticator = config
            .auth_enabled
            .then(|| DigestAuthenticator::new(&config.realm(), &config.secret));

        Ok(Self {
            config: Arc::new(config),
            endpoint,
            authenticator,
            advertised,
        })
    }

    /// Check if authentication is required
    pub fn requires_auth(&self) -> bool {
        self.authenticator.is_some()
    }

    /// `<sip:user@ip:port>` for the Contact header.
    pub fn contact(&self) -> String {
        format!(
            "<sip:{}@{}>",
            self.config.user,
            self.advertised
        )
    }

    /// Serializes `message` and sends it to `peer`.
    pub async fn send(&self, message: &SipMessage, peer: SocketAddr) -> Result<(), CallError> {
        let wire = serialize_message(message);
        debug!(%peer, start = %wire.lines().next().unwrap_or_default(), "sending");
        self.endpoint
            .send_to(wire.as_bytes(), peer)
            .await
            .map_err(CallError::Transport)
    }
}
