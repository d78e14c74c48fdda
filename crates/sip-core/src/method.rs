// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use smol_str::SmolStr;

/// SIP request methods recognized by the honeypot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Invite,
    Ack,
    Options,
    Bye,
    Cancel,
    Register,
    Unknown(SmolStr),
}

impl Method {
    /// Every method token the dispatcher routes, in wire order.
    pub const RECOGNIZED: [Method; 6] = [
        Method::Invite,
        Method::Ack,
        Method::Options,
        Method::Bye,
        Method::Cancel,
        Method::Register,
    ];

    /// Returns the canonical uppercase string representation for this method.
    pub fn as_str(&self) -> &str {
        match self {
            Method::Invite => "INVITE",
            Method::Ack => "ACK",
            Method::Options => "OPTIONS",
            Method::Bye => "BYE",
            Method::Cancel => "CANCEL",
            Method::Register => "REGISTER",
            Method::Unknown(token) => token.as_str(),
        }
    }

    /// Parses a method token, returning Unknown for anything outside the set.
    ///
    /// Method names are case-sensitive (RFC 3261 §7.1), so `invite` is an
    /// unknown extension token rather than INVITE.
    pub fn from_token(token: &str) -> Self {
        match token {
            "INVITE" => Method::Invite,
            "ACK" => Method::Ack,
            "OPTIONS" => Method::Options,
            "BYE" => Method::Bye,
            "CANCEL" => Method::Cancel,
            "REGISTER" => Method::Register,
            other => Method::Unknown(SmolStr::new(other)),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Method::Unknown(_))
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_tokens_roundtrip() {
        for method in Method::RECOGNIZED {
            assert_eq!(Method::from_token(method.as_str()), method);
        }
    }

    #[test]
    fn lowercase_token_is_unknown() {
        let method = Method::from_token("invite");
        assert!(method.is_unknown());
        assert_eq!(method.as_str(), "invite");
    }
}
