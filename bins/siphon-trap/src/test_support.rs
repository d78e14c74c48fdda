// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixtures shared by the unit tests of this crate.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::Path,
    sync::Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use sip_core::SipMessage;
use sip_parse::parse_message;
use sip_transport::Endpoint;

use crate::{config::HoneypotConfig, services::ServiceRegistry};

/// Endpoint that records every outbound datagram instead of sending it.
pub struct RecordingEndpoint {
    sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
}

impl RecordingEndpoint {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<(Vec<u8>, SocketAddr)> {
        self.sent.lock().clone()
    }

    /// Sent datagrams parsed back into messages.
    pub fn messages(&self) -> Vec<SipMessage> {
        self.sent
            .lock()
            .iter()
            .map(|(bytes, _)| parse_message(bytes).expect("honeypot sent unparsable message"))
            .collect()
    }
}

#[async_trait]
impl Endpoint for RecordingEndpoint {
    async fn send_to(&self, data: &[u8], peer: SocketAddr) -> Result<()> {
        self.sent.lock().push((data.to_vec(), peer));
        Ok(())
    }

    async fn recv_from(&self, _buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        std::future::pending().await
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5060))
    }
}

pub fn test_config(auth_enabled: bool, capture_dir: &Path) -> HoneypotConfig {
    HoneypotConfig {
        auth_enabled,
        capture_dir: capture_dir.to_path_buf(),
        rtp_bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
        ..HoneypotConfig::default()
    }
}

pub fn registry_with(
    config: HoneypotConfig,
    endpoint: Arc<RecordingEndpoint>,
) -> (ServiceRegistry, Arc<RecordingEndpoint>) {
    let services = ServiceRegistry::new(config, endpoint.clone()).expect("registry");
    (services, endpoint)
}

/// Registry over a recording endpoint. Captures land in the system temp dir,
/// which stays empty unless a test actually sends RTP.
pub fn registry(
    endpoint: Arc<RecordingEndpoint>,
    auth_enabled: bool,
) -> (ServiceRegistry, Arc<RecordingEndpoint>) {
    registry_with(test_config(auth_enabled, &std::env::temp_dir()), endpoint)
}

pub const OFFER: &str = "v=0\r\n\
o=scanner 2890844526 2890844526 IN IP4 127.0.0.1\r\n\
s=-\r\n\
c=IN IP4 127.0.0.1\r\n\
t=0 0\r\n\
m=audio 49170 RTP/AVP 0\r\n\
a=rtpmap:0 PCMU/8000\r\n";

/// INVITE for `call_id` carrying [`OFFER`], optionally with credentials.
pub fn invite_with_sdp(call_id: &str, authorization: Option<&str>) -> String {
    let mut msg = format!(
        "INVITE sip:100@127.0.0.1 SIP/2.0\r\n\
         Via: SIP/2.0/UDP 127.0.0.1:40000;branch=z9hG4bK-{call_id}\r\n\
         Max-Forwards: 70\r\n\
         To: <sip:100@127.0.0.1>\r\n\
         From: <sip:scanner@127.0.0.1>;tag=scan\r\n\
         Call-ID: {call_id}\r\n\
         CSeq: 1 INVITE\r\n\
         Contact: <sip:scanner@127.0.0.1:40000>\r\n\
         Content-Type: application/sdp\r\n"
    );
    if let Some(authorization) = authorization {
        msg.push_str(&format!("Authorization: {authorization}\r\n"));
    }
    msg.push_str(&format!("Content-Length: {}\r\n\r\n{}", OFFER.len(), OFFER));
    msg
}

/// In-dialog request (ACK, BYE, CANCEL) for `call_id`.
pub fn in_dialog(method: &str, call_id: &str, cseq: u32) -> String {
    format!(
        "{method} sip:100@127.0.0.1 SIP/2.0\r\n\
         Via: SIP/2.0/UDP 127.0.0.1:40000;branch=z9hG4bK-{method}-{cseq}\r\n\
         To: <sip:100@127.0.0.1>\r\n\
         From: <sip:scanner@127.0.0.1>;tag=scan\r\n\
         Call-ID: {call_id}\r\n\
         CSeq: {cseq} {method}\r\n\
         Content-Length: 0\r\n\r\n"
    )
}
