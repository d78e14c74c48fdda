// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SIP Digest challenge engine (RFC 2617 MD5).
//!
//! The honeypot uses a single shared secret for every username: any caller
//! that can produce a correct digest for the configured realm is "let in".
//! Nonces are not tracked, so a replayed Authorization is accepted; the
//! point is to record what attackers send, not to keep them out.
//!
//! # Examples
//!
//! ```
//! # use sip_auth::*;
//! # use sip_core::Method;
//! let auth = DigestAuthenticator::new("100@localhost", "45GTY9F3");
//! let challenge = auth.issue_challenge();
//! assert!(challenge.header_value().starts_with("Digest realm=\"100@localhost\""));
//!
//! let response = compute_expected(
//!     "100", "100@localhost", "45GTY9F3", &challenge.nonce, "INVITE", "sip:100@localhost",
//! );
//! let authorization = format!(
//!     "Digest username=\"100\", realm=\"100@localhost\", nonce=\"{}\", uri=\"sip:100@localhost\", response=\"{}\"",
//!     challenge.nonce, response
//! );
//! assert!(auth.validate(&authorization, &Method::Invite));
//! ```

use std::collections::HashMap;

use rand::{thread_rng, RngCore};
use sip_core::Method;
use smol_str::SmolStr;
use thiserror::Error;

const MAX_PARAM_USERNAME_LEN: usize = 256;
const MAX_PARAM_REALM_LEN: usize = 256;
const MAX_PARAM_NONCE_LEN: usize = 128;
const MAX_PARAM_URI_LEN: usize = 2048;
const MAX_PARAM_RESPONSE_LEN: usize = 512;
const MAX_PARAM_CNONCE_LEN: usize = 256;
const MAX_PARAM_NC_LEN: usize = 8;

/// Why an Authorization header did not verify.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authorization scheme is not Digest")]
    NotDigest,
    #[error("missing digest parameter {0}")]
    MissingParam(&'static str),
    #[error("digest parameter {0} is too long or contains control characters")]
    InvalidParam(&'static str),
    #[error("realm {0:?} does not match")]
    RealmMismatch(SmolStr),
    #[error("unsupported algorithm {0:?}")]
    UnsupportedAlgorithm(SmolStr),
    #[error("unsupported qop {0:?}")]
    UnsupportedQop(SmolStr),
    #[error("digest response does not match")]
    ResponseMismatch,
}

/// A challenge sent in `WWW-Authenticate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: SmolStr,
    pub nonce: SmolStr,
}

impl DigestChallenge {
    pub fn header_value(&self) -> String {
        format!(
            "Digest realm=\"{}\", nonce=\"{}\", algorithm=MD5",
            self.realm, self.nonce
        )
    }
}

/// Parameters extracted from a Digest `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestCredentials {
    pub username: SmolStr,
    pub realm: SmolStr,
    pub nonce: SmolStr,
    pub uri: SmolStr,
    pub response: SmolStr,
    pub qop: Option<SmolStr>,
    pub nc: Option<SmolStr>,
    pub cnonce: Option<SmolStr>,
}

impl DigestCredentials {
    /// Parses `Digest key="value", key=value, ...`.
    ///
    /// Whitespace (including line breaks) between parameters is ignored and
    /// values may be quoted or bare.
    pub fn parse(authorization: &str) -> Result<Self, AuthError> {
        let trimmed = authorization.trim();
        let (scheme, rest) = trimmed
            .split_once(char::is_whitespace)
            .ok_or(AuthError::NotDigest)?;
        if !scheme.eq_ignore_ascii_case("Digest") {
            return Err(AuthError::NotDigest);
        }

        let params = parse_params(rest);
        if let Some(algorithm) = params.get("algorithm") {
            if !algorithm.eq_ignore_ascii_case("MD5") {
                return Err(AuthError::UnsupportedAlgorithm(algorithm.clone()));
            }
        }

        let required = |name: &'static str, max: usize| -> Result<SmolStr, AuthError> {
            let value = params.get(name).ok_or(AuthError::MissingParam(name))?;
            validate_param(name, value, max)?;
            Ok(value.clone())
        };
        let optional = |name: &'static str, max: usize| -> Result<Option<SmolStr>, AuthError> {
            match params.get(name) {
                Some(value) => validate_param(name, value, max).map(|_| Some(value.clone())),
                None => Ok(None),
            }
        };

        Ok(Self {
            username: required("username", MAX_PARAM_USERNAME_LEN)?,
            realm: required("realm", MAX_PARAM_REALM_LEN)?,
            nonce: required("nonce", MAX_PARAM_NONCE_LEN)?,
            uri: required("uri", MAX_PARAM_URI_LEN)?,
            response: required("response", MAX_PARAM_RESPONSE_LEN)?,
            qop: optional("qop", MAX_PARAM_CNONCE_LEN)?,
            nc: optional("nc", MAX_PARAM_NC_LEN)?,
            cnonce: optional("cnonce", MAX_PARAM_CNONCE_LEN)?,
        })
    }
}

fn validate_param(name: &'static str, value: &str, max_len: usize) -> Result<(), AuthError> {
    if value.len() > max_len || value.chars().any(|c| c.is_control()) {
        return Err(AuthError::InvalidParam(name));
    }
    Ok(())
}

/// Splits the parameter list on commas outside quoted strings.
fn parse_params(input: &str) -> HashMap<String, SmolStr> {
    let mut params = HashMap::new();
    let mut in_quotes = false;
    let mut start = 0;
    let mut pieces = Vec::new();
    for (idx, ch) in input.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                pieces.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push(&input[start..]);

    for piece in pieces {
        let Some((key, value)) = piece.split_once('=') else {
            continue;
        };
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        params.insert(key.trim().to_ascii_lowercase(), SmolStr::new(value));
    }
    params
}

fn hash(data: &str) -> String {
    format!("{:x}", md5::compute(data.as_bytes()))
}

/// `MD5(MD5(username:realm:secret):nonce:MD5(method:uri))` in lower-case hex.
pub fn compute_expected(
    username: &str,
    realm: &str,
    secret: &str,
    nonce: &str,
    method: &str,
    uri: &str,
) -> String {
    let ha1 = hash(&format!("{}:{}:{}", username, realm, secret));
    let ha2 = hash(&format!("{}:{}", method, uri));
    hash(&format!("{}:{}:{}", ha1, nonce, ha2))
}

/// The RFC 2617 `qop=auth` variant, which mixes in `nc` and `cnonce`.
#[allow(clippy::too_many_arguments)]
pub fn compute_expected_with_qop(
    username: &str,
    realm: &str,
    secret: &str,
    nonce: &str,
    nc: &str,
    cnonce: &str,
    method: &str,
    uri: &str,
) -> String {
    let ha1 = hash(&format!("{}:{}:{}", username, realm, secret));
    let ha2 = hash(&format!("{}:{}", method, uri));
    hash(&format!("{}:{}:{}:{}:auth:{}", ha1, nonce, nc, cnonce, ha2))
}

/// Issues challenges and checks answers against the shared secret.
#[derive(Debug, Clone)]
pub struct DigestAuthenticator {
    realm: SmolStr,
    secret: SmolStr,
}

impl DigestAuthenticator {
    pub fn new(realm: &str, secret: &str) -> Self {
        Self {
            realm: SmolStr::new(realm),
            secret: SmolStr::new(secret),
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Creates a challenge with a fresh nonce (hex MD5 of random bytes).
    pub fn issue_challenge(&self) -> DigestChallenge {
        let mut seed = [0u8; 16];
        thread_rng().fill_bytes(&mut seed);
        DigestChallenge {
            realm: self.realm.clone(),
            nonce: SmolStr::new(format!("{:x}", md5::compute(seed))),
        }
    }

    /// Returns true when `authorization` carries a correct digest for `method`.
    pub fn validate(&self, authorization: &str, method: &Method) -> bool {
        self.verify(authorization, method).is_ok()
    }

    /// Like [`validate`](Self::validate) but reports why verification failed.
    pub fn verify(&self, authorization: &str, method: &Method) -> Result<DigestCredentials, AuthError> {
        let creds = DigestCredentials::parse(authorization)?;
        if creds.realm != self.realm {
            return Err(AuthError::RealmMismatch(creds.realm));
        }

        let expected = match creds.qop.as_deref() {
            None => compute_expected(
                &creds.username,
                &creds.realm,
                &self.secret,
                &creds.nonce,
                method.as_str(),
                &creds.uri,
            ),
            Some(qop) if qop.eq_ignore_ascii_case("auth") => {
                let nc = creds.nc.as_deref().ok_or(AuthError::MissingParam("nc"))?;
                let cnonce = creds
                    .cnonce
                    .as_deref()
                    .ok_or(AuthError::MissingParam("cnonce"))?;
                compute_expected_with_qop(
                    &creds.username,
                    &creds.realm,
                    &self.secret,
                    &creds.nonce,
                    nc,
                    cnonce,
                    method.as_str(),
                    &creds.uri,
                )
            }
            Some(other) => return Err(AuthError::UnsupportedQop(SmolStr::new(other))),
        };

        if constant_time_eq(
            expected.as_bytes(),
            creds.response.to_ascii_lowercase().as_bytes(),
        ) {
            Ok(creds)
        } else {
            Err(AuthError::ResponseMismatch)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}
