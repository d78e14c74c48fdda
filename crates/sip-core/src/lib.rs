// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core SIP types shared by the honeypot crates.
//!
//! - **Messages**: [`SipMessage`] and [`MessageKind`]
//! - **Headers**: [`Headers`] container keyed by the whitelisted [`HeaderName`] set
//! - **Methods**: [`Method`] (INVITE, ACK, OPTIONS, BYE, CANCEL, REGISTER)
//! - **Status codes**: [`StatusCode`] with wire reason phrases
//!
//! Header values are held as [`SmolStr`](smol_str::SmolStr), which keeps
//! the short values typical of SIP inline.
//!
//! # Examples
//!
//! ```
//! # use sip_core::*;
//! let mut msg = SipMessage::response(StatusCode::OK);
//! msg.headers.insert(HeaderName::CallId, "a84b4c76e66710");
//! assert_eq!(msg.call_id(), Some("a84b4c76e66710"));
//! assert_eq!(HeaderName::parse("i"), Some(HeaderName::CallId));
//! ```

pub mod headers;
pub mod method;
pub mod msg;
pub mod status;

pub use headers::{Header, HeaderName, Headers};
pub use method::Method;
pub use msg::{CSeq, MessageKind, SipMessage, SIP_VERSION};
pub use status::StatusCode;
