// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Datagram endpoint abstraction and the UDP receive loop.
//!
//! Handlers never own a socket; they send through an [`Endpoint`] handed to
//! them, which keeps them testable against an in-memory endpoint.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{ToSocketAddrs, UdpSocket};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Largest datagram the receive loop accepts without flagging truncation.
pub const MAX_DATAGRAM: usize = 65_535;

/// A bound datagram socket.
#[async_trait]
pub trait Endpoint: Send + Sync {
    async fn send_to(&self, data: &[u8], to: SocketAddr) -> Result<()>;
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)>;
    fn local_addr(&self) -> Result<SocketAddr>;
}

/// [`Endpoint`] backed by a tokio UDP socket.
#[derive(Debug, Clone)]
pub struct UdpEndpoint {
    socket: Arc<UdpSocket>,
}

impl UdpEndpoint {
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::from_socket(socket))
    }

    pub fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket: Arc::new(socket),
        }
    }
}

#[async_trait]
impl Endpoint for UdpEndpoint {
    async fn send_to(&self, data: &[u8], to: SocketAddr) -> Result<()> {
        send_udp(&self.socket, &to, data).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        Ok(self.socket.recv_from(buf).await?)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

/// Bundle representing a datagram received by the listener.
#[derive(Debug, Clone)]
pub struct InboundPacket {
    pub peer: SocketAddr,
    pub payload: Bytes,
}

/// Runs a receive loop and forwards packets to the provided channel.
///
/// Returns once the receiving side of `tx` is dropped.
pub async fn run_udp(endpoint: Arc<dyn Endpoint>, tx: mpsc::Sender<InboundPacket>) -> Result<()> {
    let bind = endpoint.local_addr()?;
    info!(%bind, "listening (udp)");
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        match endpoint.recv_from(&mut buf).await {
            Ok((n, peer)) => {
                if n == buf.len() {
                    error!(%peer, max = n, "udp datagram likely truncated (buffer full)");
                }
                debug!(%peer, len = n, "udp datagram");
                let packet = InboundPacket {
                    peer,
                    payload: Bytes::copy_from_slice(&buf[..n]),
                };
                if tx.send(packet).await.is_err() {
                    info!("receiver dropped; shutting down udp loop");
                    break;
                }
            }
            Err(e) => {
                // ICMP port-unreachable surfaces here on some platforms.
                error!(%e, "udp recv_from error");
            }
        }
    }
    Ok(())
}

/// Sends a UDP datagram using an existing bound socket.
pub async fn send_udp(socket: &UdpSocket, to: &SocketAddr, data: &[u8]) -> Result<()> {
    socket.send_to(data, to).await?;
    Ok(())
}
