// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Call session state machine.
///
/// One session exists per accepted Call-ID. Absence from the
/// [`SessionTable`] is the "no session" state; a session is created already
/// in `Setup` and leaves the table when it reaches `Teardown`.
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
};

use chrono::{DateTime, Utc};
use rtp_capture::{CaptureChannel, CaptureStats};
use sip_core::{CSeq, HeaderName, Method, SipMessage, StatusCode};
use sip_sdp::{SdpAnswer, SdpMessage};
use smol_str::SmolStr;
use tracing::{info, warn};

use crate::{
    error::{CallError, Violation},
    services::ServiceRegistry,
    transport::{generate_tag, response_for, set_body, TransportContext},
};

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 180/200 sent, waiting for ACK
    Setup,
    /// ACK received; media expected
    Active,
    /// BYE received or call cancelled
    Teardown,
}

/// A call accepted by the honeypot.
#[derive(Debug)]
pub struct CallSession {
    pub call_id: SmolStr,
    pub state: SessionState,
    pub remote_sip: SocketAddr,
    /// Media address announced in the caller's offer
    pub remote_rtp: Option<SocketAddr>,
    pub peer_from: SmolStr,
    /// Tag this side put on To; stays the same for the whole call
    pub local_tag: SmolStr,
    pub invite_cseq: u32,
    pub created_at: DateTime<Utc>,
    capture: Option<CaptureChannel>,
}

impl CallSession {
    /// Accepts an INVITE: binds the capture channel, then sends 180 and 200.
    pub async fn establish(
        request: &SipMessage,
        offer: &SdpMessage,
        ctx: &TransportContext,
        services: &ServiceRegistry,
    ) -> Result<Self, CallError> {
        let call_id = request
            .call_id()
            .ok_or(Violation::MissingHeader(HeaderName::CallId))?;
        let cseq = request.cseq().ok_or_else(|| {
            Violation::InvalidCSeq(SmolStr::new(
                request.header(HeaderName::CSeq).unwrap_or_default(),
            ))
        })?;
        let origin = offer.origin().ok_or(Violation::MissingOrigin)?;
        let audio = offer.audio_media().ok_or(Violation::NoAudioMedia)?;
        let remote_rtp = audio
            .connection_address
            .as_deref()
            .and_then(|addr| addr.parse::<IpAddr>().ok())
            .map(|ip| SocketAddr::new(ip, audio.port));

        let capture = CaptureChannel::open(services.config.rtp_bind, &services.config.capture_dir)
            .await
            .map_err(|e| CallError::Transport(e.into()))?;

        let session = Self {
            call_id: SmolStr::new(call_id),
            state: SessionState::Setup,
            remote_sip: ctx.peer,
            remote_rtp,
            peer_from: SmolStr::new(request.header(HeaderName::From).unwrap_or_default()),
            local_tag: generate_tag(),
            invite_cseq: cseq.number,
            created_at: Utc::now(),
            capture: Some(capture),
        };

        let ringing = session.reply(request, StatusCode::RINGING, services);
        services.send(&ringing, ctx.peer).await?;

        let answer = SdpAnswer::new(
            &services.config.user,
            services.advertised.ip(),
            session.capture_port(),
        )
        .and_then(|answer| answer.session_id(&session.created_at.timestamp().to_string()))
        .map_err(|e| CallError::Transport(e.into()))?;
        let mut ok = session.reply(request, StatusCode::OK, services);
        set_body(&mut ok, "application/sdp", answer.render());
        services.send(&ok, ctx.peer).await?;

        info!(
            call_id = %session.call_id,
            peer = %ctx.peer,
            from = %session.peer_from,
            offer_user = %origin.username,
            remote_rtp = ?session.remote_rtp,
            rtp_port = session.capture_port(),
            "call accepted"
        );
        Ok(session)
    }

    /// Response to `request` carrying this session's To-tag.
    pub fn reply(
        &self,
        request: &SipMessage,
        status: StatusCode,
        services: &ServiceRegistry,
    ) -> SipMessage {
        response_for(request, status, &self.local_tag, services)
    }

    /// True when `cseq` belongs to the INVITE transaction that created this
    /// call: same sequence number, method INVITE, ACK or CANCEL.
    pub fn matches_invite(&self, cseq: &CSeq) -> bool {
        cseq.number == self.invite_cseq
            && matches!(cseq.method, Method::Invite | Method::Ack | Method::Cancel)
    }

    /// Local port media is captured on (0 once released).
    pub fn capture_port(&self) -> u16 {
        self.capture.as_ref().map(CaptureChannel::port).unwrap_or(0)
    }

    /// Handles ACK. Returns false when it was a retransmission.
    pub fn acknowledge(&mut self) -> bool {
        match self.state {
            SessionState::Setup => {
                self.state = SessionState::Active;
                true
            }
            SessionState::Active | SessionState::Teardown => false,
        }
    }

    /// Moves to `Teardown` and closes the capture channel.
    pub async fn terminate(&mut self) -> CaptureStats {
        self.state = SessionState::Teardown;
        match self.capture.take() {
            Some(capture) => capture.close().await,
            None => {
                warn!(call_id = %self.call_id, "capture already released");
                CaptureStats::default()
            }
        }
    }
}

/// Live sessions keyed by Call-ID.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<SmolStr, CallSession>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, call_id: &str) -> bool {
        self.sessions.contains_key(call_id)
    }

    pub fn get(&self, call_id: &str) -> Option<&CallSession> {
        self.sessions.get(call_id)
    }

    /// Finds the session for an in-dialog request.
    pub fn lookup_mut(&mut self, call_id: &str) -> Result<&mut CallSession, CallError> {
        self.sessions
            .get_mut(call_id)
            .ok_or_else(|| CallError::SessionLookup(SmolStr::new(call_id)))
    }

    pub fn insert(&mut self, session: CallSession) {
        self.sessions.insert(session.call_id.clone(), session);
    }

    pub fn remove(&mut self, call_id: &str) -> Option<CallSession> {
        self.sessions.remove(call_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Empties the table, handing back every session.
    pub fn drain(&mut self) -> Vec<CallSession> {
        self.sessions.drain().map(|(_, session)| session).collect()
    }
}
