// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end call flows against a honeypot on loopback UDP.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use sip_auth::compute_expected;
use sip_core::{HeaderName, SipMessage};
use sip_parse::parse_message;
use siphon_trap::{Honeypot, HoneypotConfig};
use tempfile::TempDir;
use tokio::{net::UdpSocket, sync::oneshot, task::JoinHandle, time::timeout};

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(300);
const URI: &str = "sip:100@127.0.0.1";

const OFFER: &str = "v=0\r\n\
o=scanner 1 1 IN IP4 127.0.0.1\r\n\
s=-\r\n\
c=IN IP4 127.0.0.1\r\n\
t=0 0\r\n\
m=audio 40002 RTP/AVP 0 8\r\n";

struct Harness {
    sip: SocketAddr,
    client: UdpSocket,
    captures: TempDir,
    stop: Option<oneshot::Sender<()>>,
    server: JoinHandle<anyhow::Result<()>>,
}

impl Harness {
    async fn start(auth_enabled: bool) -> Self {
        let captures = tempfile::tempdir().unwrap();
        let config = HoneypotConfig {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            rtp_bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            capture_dir: captures.path().to_path_buf(),
            auth_enabled,
            ..HoneypotConfig::default()
        };
        let honeypot = Honeypot::bind(config).await.unwrap();
        let sip = honeypot.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(honeypot.serve(async {
            let _ = stopped.await;
        }));
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        Self {
            sip,
            client,
            captures,
            stop: Some(stop),
            server,
        }
    }

    async fn send(&self, raw: &str) {
        self.client.send_to(raw.as_bytes(), self.sip).await.unwrap();
    }

    async fn recv(&self) -> SipMessage {
        let mut buf = vec![0u8; 65_535];
        let (n, from) = timeout(WAIT, self.client.recv_from(&mut buf))
            .await
            .expect("timed out waiting for a response")
            .unwrap();
        assert_eq!(from, self.sip);
        parse_message(&buf[..n]).unwrap()
    }

    async fn assert_silent(&self) {
        let mut buf = vec![0u8; 65_535];
        assert!(
            timeout(QUIET, self.client.recv_from(&mut buf)).await.is_err(),
            "expected no response"
        );
    }

    fn client_addr(&self) -> SocketAddr {
        self.client.local_addr().unwrap()
    }

    fn invite(&self, call_id: &str, authorization: Option<&str>) -> String {
        let mut msg = format!(
            "INVITE {URI} SIP/2.0\r\n\
             v: SIP/2.0/UDP {addr};branch=z9hG4bK-{call_id}\r\n\
             Max-Forwards: 69\r\n\
             t: <{URI}>\r\n\
             f: <sip:scanner@127.0.0.1>;tag=1928301774\r\n\
             i: {call_id}\r\n\
             CSeq: 1 INVITE\r\n\
             m: <sip:scanner@{addr}>\r\n\
             c: application/sdp\r\n\
             User-Agent: friendly-scanner\r\n",
            addr = self.client_addr()
        );
        if let Some(authorization) = authorization {
            msg.push_str(&format!("Authorization: {authorization}\r\n"));
        }
        msg.push_str(&format!("l: {}\r\n\r\n{}", OFFER.len(), OFFER));
        msg
    }

    fn in_dialog(&self, method: &str, call_id: &str, cseq: u32) -> String {
        format!(
            "{method} {URI} SIP/2.0\r\n\
             Via: SIP/2.0/UDP {addr};branch=z9hG4bK-{method}-{cseq}\r\n\
             To: <{URI}>;tag=whatever\r\n\
             From: <sip:scanner@127.0.0.1>;tag=1928301774\r\n\
             Call-ID: {call_id}\r\n\
             CSeq: {cseq} {method}\r\n\
             Content-Length: 0\r\n\r\n",
            addr = self.client_addr()
        )
    }

    /// INVITE without auth, then ACK. Returns the advertised RTP address.
    async fn establish(&self, call_id: &str) -> SocketAddr {
        self.send(&self.invite(call_id, None)).await;
        assert_eq!(self.recv().await.status_code(), Some(180));
        let ok = self.recv().await;
        assert_eq!(ok.status_code(), Some(200));
        self.send(&self.in_dialog("ACK", call_id, 1)).await;
        rtp_target(&ok)
    }

    async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        timeout(WAIT, self.server)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }
}

fn rtp_target(ok: &SipMessage) -> SocketAddr {
    let answer = sip_sdp::parse(&ok.body).unwrap();
    let audio = answer.audio_media().expect("answer has audio");
    let ip: IpAddr = audio.connection_address.unwrap().parse().unwrap();
    SocketAddr::new(ip, audio.port)
}

fn nonce_of(challenge: &str) -> String {
    let start = challenge.find("nonce=\"").unwrap() + "nonce=\"".len();
    let len = challenge[start..].find('"').unwrap();
    challenge[start..start + len].to_owned()
}

fn artifacts(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    found.sort();
    found
}

fn is_artifact_name(name: &str) -> bool {
    // rtp-YYYYMMDDTHHMMSS.ffffffZ-xxxxxxxx.rtpdump
    let Some(rest) = name
        .strip_prefix("rtp-")
        .and_then(|r| r.strip_suffix(".rtpdump"))
    else {
        return false;
    };
    let Some((stamp, discriminator)) = rest.rsplit_once('-') else {
        return false;
    };
    stamp.len() == "20250101T000000.000000Z".len()
        && stamp.as_bytes()[8] == b'T'
        && stamp.ends_with('Z')
        && discriminator.len() == 8
        && discriminator.chars().all(|c| c.is_ascii_alphanumeric())
}

#[tokio::test]
async fn options_ping_advertises_methods() {
    let harness = Harness::start(false).await;
    harness
        .send(&format!(
            "OPTIONS {URI} SIP/2.0\r\n\
             Via: SIP/2.0/UDP {addr};branch=z9hG4bK-opt\r\n\
             From: <sip:scanner@127.0.0.1>;tag=p\r\n\
             To: <{URI}>\r\n\
             Call-ID: ping\r\n\
             CSeq: 42 OPTIONS\r\n\r\n",
            addr = harness.client_addr()
        ))
        .await;

    let response = harness.recv().await;
    assert_eq!(response.status_code(), Some(200));
    let allow = response.header(HeaderName::Allow).unwrap();
    for method in ["INVITE", "OPTIONS", "ACK", "CANCEL", "BYE"] {
        assert!(allow.contains(method), "Allow lacks {method}: {allow}");
    }
    assert!(!allow.contains("REGISTER"));
    assert_eq!(response.header(HeaderName::CSeq), Some("42 OPTIONS"));
    assert_eq!(response.header(HeaderName::UserAgent), Some("softphone"));
    harness.stop().await;
}

#[tokio::test]
async fn digest_challenge_then_call_is_accepted() {
    let harness = Harness::start(true).await;
    harness.send(&harness.invite("call-b", None)).await;

    let challenge = harness.recv().await;
    assert_eq!(challenge.status_code(), Some(401));
    let www = challenge.header(HeaderName::WwwAuthenticate).unwrap();
    assert!(www.contains("realm=\"100@localhost\""));
    let nonce = nonce_of(www);
    assert!(!nonce.is_empty());

    let response = compute_expected("100", "100@localhost", "45GTY9F3", &nonce, "INVITE", URI);
    let authorization = format!(
        "Digest username=\"100\", realm=\"100@localhost\", nonce=\"{nonce}\", uri=\"{URI}\", response=\"{response}\", algorithm=MD5"
    );
    harness
        .send(&harness.invite("call-b", Some(&authorization)))
        .await;

    let ringing = harness.recv().await;
    assert_eq!(ringing.status_code(), Some(180));
    let ok = harness.recv().await;
    assert_eq!(ok.status_code(), Some(200));
    assert_eq!(ok.header(HeaderName::ContentType), Some("application/sdp"));
    assert_eq!(ok.header(HeaderName::MaxForwards), Some("69"));
    assert_eq!(
        ok.header(HeaderName::To),
        ringing.header(HeaderName::To),
        "To-tag must be stable within the call"
    );

    let answer = sip_sdp::parse(&ok.body).unwrap();
    let port = answer.audio_media().unwrap().port;
    assert_ne!(port, 0);
    assert_eq!(
        answer.media[0][&'m'],
        format!("audio {port} RTP/AVP 0").as_str()
    );
    harness.stop().await;
}

#[tokio::test]
async fn rtp_after_ack_is_captured_verbatim() {
    let harness = Harness::start(false).await;
    let rtp = harness.establish("call-c").await;

    let media = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let first = [0x80u8, 0x00, 0x00, 0x01, 0xde, 0xad, 0xbe, 0xef];
    let second = [0x80u8, 0x00, 0x00, 0x02, 0xca, 0xfe];
    media.send_to(&first, rtp).await.unwrap();
    media.send_to(&second, rtp).await.unwrap();

    // BYE closes the capture, which drains and flushes before the 200.
    harness.send(&harness.in_dialog("BYE", "call-c", 2)).await;
    assert_eq!(harness.recv().await.status_code(), Some(200));

    let files = artifacts(harness.captures.path());
    assert_eq!(files.len(), 1, "{files:?}");
    let name = files[0].file_name().unwrap().to_str().unwrap();
    assert!(is_artifact_name(name), "unexpected artifact name {name}");
    let mut expected = first.to_vec();
    expected.extend_from_slice(&second);
    assert_eq!(std::fs::read(&files[0]).unwrap(), expected);
    harness.stop().await;
}

#[tokio::test]
async fn second_bye_is_dropped() {
    let harness = Harness::start(false).await;
    harness.establish("call-d").await;

    let bye = harness.in_dialog("BYE", "call-d", 2);
    harness.send(&bye).await;
    let ok = harness.recv().await;
    assert_eq!(ok.status_code(), Some(200));
    assert_eq!(ok.header(HeaderName::CSeq), Some("2 BYE"));
    assert_eq!(ok.call_id(), Some("call-d"));

    harness.send(&bye).await;
    harness.assert_silent().await;

    // A call that never saw media leaves no artifact behind.
    assert!(artifacts(harness.captures.path()).is_empty());
    harness.stop().await;
}

#[tokio::test]
async fn cancel_before_ack_and_register_decoy() {
    let harness = Harness::start(false).await;
    harness.send(&harness.invite("call-e", None)).await;
    assert_eq!(harness.recv().await.status_code(), Some(180));
    assert_eq!(harness.recv().await.status_code(), Some(200));

    harness.send(&harness.in_dialog("CANCEL", "call-e", 1)).await;
    let ok = harness.recv().await;
    assert_eq!(ok.status_code(), Some(200));
    assert_eq!(ok.header(HeaderName::CSeq), Some("1 CANCEL"));

    harness.send(&harness.in_dialog("BYE", "call-e", 2)).await;
    harness.assert_silent().await;

    harness
        .send(&format!(
            "REGISTER sip:127.0.0.1 SIP/2.0\r\n\
             Via: SIP/2.0/UDP {addr};branch=z9hG4bK-reg\r\n\
             From: <sip:1001@127.0.0.1>;tag=r\r\n\
             To: <sip:1001@127.0.0.1>\r\n\
             Call-ID: reg\r\n\
             CSeq: 1 REGISTER\r\n\
             Contact: <sip:1001@{addr}>\r\n\
             Expires: 60\r\n\r\n",
            addr = harness.client_addr()
        ))
        .await;
    let registered = harness.recv().await;
    assert_eq!(registered.status_code(), Some(200));
    assert_eq!(registered.header(HeaderName::Expires), Some("60"));
    harness.stop().await;
}

#[tokio::test]
async fn malformed_traffic_does_not_stop_the_daemon() {
    let harness = Harness::start(false).await;
    harness.send("\r\n\r\n").await;
    harness.send("GET / HTTP/1.1\r\nHost: x\r\n\r\n").await;
    harness.send("INVITE sip:x SIP/2.0\r\nBogus-Header: 1\r\n\r\n").await;
    harness.assert_silent().await;

    let rtp = harness.establish("call-f").await;
    assert_eq!(rtp.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    harness.stop().await;
}
