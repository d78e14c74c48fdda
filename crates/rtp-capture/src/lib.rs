// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-call RTP capture.
//!
//! A [`CaptureChannel`] binds an ephemeral UDP port and appends the raw
//! payload of every datagram it receives to a capture artifact, with no
//! framing. The artifact is only created when the first datagram arrives,
//! so calls that never send media leave nothing behind.
//!
//! Storage failures never propagate to the caller: the channel logs the
//! [`CaptureError`] and keeps draining the socket into a discarding sink.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const MAX_RTP_DATAGRAM: usize = 65_535;

/// File extension of capture artifacts.
pub const ARTIFACT_EXTENSION: &str = "rtpdump";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to bind capture socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("capture storage failed for {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Totals reported when a channel is closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Datagrams received, whether or not they were persisted.
    pub packets: u64,
    pub bytes: u64,
    /// Sender of the first datagram.
    pub remote: Option<SocketAddr>,
    /// Artifact written, if any media arrived and storage worked.
    pub path: Option<PathBuf>,
}

/// Builds `rtp-<UTC timestamp>-<8 random alphanumerics>.rtpdump`.
pub fn artifact_name() -> String {
    let discriminator: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!(
        "rtp-{}-{}.{}",
        Utc::now().format("%Y%m%dT%H%M%S%.6fZ"),
        discriminator,
        ARTIFACT_EXTENSION
    )
}

/// A bound RTP sink owned by one call session.
#[derive(Debug)]
pub struct CaptureChannel {
    local_addr: SocketAddr,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<CaptureStats>>,
}

impl CaptureChannel {
    /// Binds `bind_ip:0` and starts receiving into `capture_dir`.
    pub async fn open(bind_ip: IpAddr, capture_dir: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        let addr = SocketAddr::new(bind_ip, 0);
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| CaptureError::Bind { addr, source })?;
        let local_addr = socket
            .local_addr()
            .map_err(|source| CaptureError::Bind { addr, source })?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let sink = CaptureSink::new(capture_dir.into());
        let task = tokio::spawn(capture_loop(socket, sink, stop_rx));
        debug!(%local_addr, "rtp capture listening");

        Ok(Self {
            local_addr,
            stop_tx: Some(stop_tx),
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Stops receiving, persists queued datagrams and releases the artifact.
    pub async fn close(mut self) -> CaptureStats {
        if let Some(stop) = self.stop_tx.take() {
            let _ = stop.send(());
        }
        let Some(task) = self.task.take() else {
            return CaptureStats::default();
        };
        match task.await {
            Ok(stats) => stats,
            Err(e) => {
                error!(%e, port = self.local_addr.port(), "rtp capture task failed");
                CaptureStats::default()
            }
        }
    }
}

impl Drop for CaptureChannel {
    fn drop(&mut self) {
        // The task flushes and exits on its own once signalled.
        if let Some(stop) = self.stop_tx.take() {
            let _ = stop.send(());
        }
    }
}

async fn capture_loop(
    socket: UdpSocket,
    mut sink: CaptureSink,
    mut stop_rx: oneshot::Receiver<()>,
) -> CaptureStats {
    let mut buf = vec![0u8; MAX_RTP_DATAGRAM];
    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok((n, peer)) => sink.append(&buf[..n], peer).await,
                Err(e) => warn!(%e, "rtp recv_from error"),
            },
        }
    }

    // Readiness may not have been observed yet for datagrams already queued
    // in the kernel, so drain with plain non-blocking reads.
    match socket.into_std() {
        Ok(socket) => {
            while let Ok((n, peer)) = socket.recv_from(&mut buf) {
                sink.append(&buf[..n], peer).await;
            }
        }
        Err(e) => warn!(%e, "rtp capture drain skipped"),
    }
    sink.finish().await
}

enum SinkState {
    /// No datagram yet; nothing on disk.
    Pending,
    Writing(BufWriter<File>),
    Discarding,
}

struct CaptureSink {
    dir: PathBuf,
    state: SinkState,
    stats: CaptureStats,
}

impl CaptureSink {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            state: SinkState::Pending,
            stats: CaptureStats::default(),
        }
    }

    async fn append(&mut self, datagram: &[u8], peer: SocketAddr) {
        self.stats.packets += 1;
        self.stats.bytes += datagram.len() as u64;
        if self.stats.remote.is_none() {
            self.stats.remote = Some(peer);
        }

        if matches!(self.state, SinkState::Pending) {
            self.state = match create_artifact(&self.dir).await {
                Ok((path, file)) => {
                    info!(path = %path.display(), %peer, "rtp capture started");
                    self.stats.path = Some(path);
                    SinkState::Writing(BufWriter::new(file))
                }
                Err(e) => {
                    warn!(error = %e, "rtp capture disabled; discarding media");
                    SinkState::Discarding
                }
            };
        }

        if let SinkState::Writing(writer) = &mut self.state {
            if let Err(source) = writer.write_all(datagram).await {
                let e = CaptureError::Storage {
                    path: self.stats.path.clone().unwrap_or_default(),
                    source,
                };
                warn!(error = %e, "rtp capture write failed; discarding media");
                self.state = SinkState::Discarding;
            }
        }
    }

    async fn finish(mut self) -> CaptureStats {
        if let SinkState::Writing(mut writer) = std::mem::replace(&mut self.state, SinkState::Discarding) {
            if let Err(e) = writer.flush().await {
                warn!(%e, "rtp capture flush failed");
            }
            if let Err(e) = writer.get_mut().sync_all().await {
                debug!(%e, "rtp capture sync failed");
            }
        }
        info!(
            packets = self.stats.packets,
            bytes = self.stats.bytes,
            path = ?self.stats.path,
            "rtp capture closed"
        );
        self.stats
    }
}

async fn create_artifact(dir: &Path) -> Result<(PathBuf, File), CaptureError> {
    let path = dir.join(artifact_name());
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(|source| CaptureError::Storage {
            path: path.clone(),
            source,
        })?;
    Ok((path, file))
}
