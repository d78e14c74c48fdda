// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Daemon wiring: SIP socket, receive loop and the dispatcher.

use std::{future::Future, net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use sip_transport::{run_udp, Endpoint, InboundPacket, UdpEndpoint};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::{config::HoneypotConfig, dispatcher::Dispatcher, services::ServiceRegistry};

const INBOUND_QUEUE: usize = 1024;

/// A bound honeypot, ready to serve.
pub struct Honeypot {
    endpoint: Arc<UdpEndpoint>,
    dispatcher: Dispatcher,
}

impl Honeypot {
    /// Binds the SIP socket and prepares the capture directory.
    pub async fn bind(config: HoneypotConfig) -> Result<Self> {
        let endpoint = UdpEndpoint::bind(config.bind)
            .await
            .with_context(|| format!("failed to bind SIP socket on {}", config.bind))?;
        let endpoint = Arc::new(endpoint);

        // Captures degrade to discarding sinks if this keeps failing.
        if let Err(e) = tokio::fs::create_dir_all(&config.capture_dir).await {
            warn!(
                dir = %config.capture_dir.display(),
                error = %e,
                "capture directory unavailable; RTP will not be stored"
            );
        }

        let services = ServiceRegistry::new(config, endpoint.clone())?;
        Ok(Self {
            endpoint,
            dispatcher: Dispatcher::new(Arc::new(services)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.endpoint.local_addr()
    }

    /// Address placed in Contact and SDP answers.
    pub fn advertised_addr(&self) -> SocketAddr {
        self.dispatcher.services().advertised
    }

    /// Handles datagrams until `shutdown` resolves, then closes open calls.
    pub async fn serve<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let (tx, mut rx) = mpsc::channel::<InboundPacket>(INBOUND_QUEUE);
        let endpoint: Arc<dyn Endpoint> = self.endpoint.clone();
        let listener = tokio::spawn(async move {
            if let Err(e) = run_udp(endpoint, tx).await {
                error!(%e, "udp listener exited");
            }
        });

        let services = self.dispatcher.services().clone();
        info!(
            bind = %self.local_addr()?,
            advertised = %services.advertised,
            user = %services.config.user,
            auth = services.requires_auth(),
            captures = %services.config.capture_dir.display(),
            "honeypot listening"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                packet = rx.recv() => match packet {
                    Some(packet) => self.dispatcher.handle_packet(packet).await,
                    None => {
                        warn!("udp listener stopped");
                        break;
                    }
                },
            }
        }

        listener.abort();
        self.dispatcher.shutdown().await;
        info!("honeypot stopped");
        Ok(())
    }
}
