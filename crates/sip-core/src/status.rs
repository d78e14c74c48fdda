// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SIP response codes with the reason phrases used on the wire.
//!
//! The table follows the classic 1xx-6xx listing from "SIP Demystified".
//! The honeypot itself only emits 180, 200 and 401; the rest are available
//! for callers that want to surface a more specific rejection.

/// A SIP status code known to the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(u16);

macro_rules! status_codes {
    ($($name:ident = ($code:literal, $reason:literal);)+) => {
        impl StatusCode {
            $(pub const $name: StatusCode = StatusCode($code);)+

            /// Looks up a code in the table.
            pub fn from_u16(code: u16) -> Option<Self> {
                match code {
                    $($code => Some(StatusCode::$name),)+
                    _ => None,
                }
            }

            /// Reason phrase sent after the code.
            pub fn reason(&self) -> &'static str {
                match self.0 {
                    $($code => $reason,)+
                    _ => "Unknown",
                }
            }
        }
    };
}

status_codes! {
    TRYING = (100, "Trying");
    RINGING = (180, "Ringing");
    CALL_FORWARDED = (181, "Call Is Being Forwarded");
    QUEUED = (182, "Queued");
    SESSION_PROGRESS = (183, "Session Progress");

    OK = (200, "OK");
    ACCEPTED = (202, "Accepted");

    MULTIPLE_CHOICES = (300, "Multiple Choices");
    MOVED_PERMANENTLY = (301, "Moved Permanently");
    MOVED_TEMPORARILY = (302, "Moved Temporarily");
    USE_PROXY = (305, "Use Proxy");
    ALTERNATIVE_SERVICE = (380, "Alternative Service");

    BAD_REQUEST = (400, "Bad Request");
    UNAUTHORIZED = (401, "Unauthorized");
    PAYMENT_REQUIRED = (402, "Payment Required");
    FORBIDDEN = (403, "Forbidden");
    NOT_FOUND = (404, "Not Found");
    METHOD_NOT_ALLOWED = (405, "Method Not Allowed");
    NOT_ACCEPTABLE = (406, "Not Acceptable");
    PROXY_AUTHENTICATION_REQUIRED = (407, "Proxy Authentication Required");
    REQUEST_TIMEOUT = (408, "Request Timeout");
    CONFLICT = (409, "Conflict");
    GONE = (410, "Gone");
    LENGTH_REQUIRED = (411, "Length Required");
    REQUEST_ENTITY_TOO_LARGE = (413, "Request Entity Too Large");
    REQUEST_URI_TOO_LARGE = (414, "Request-URI Too Large");
    UNSUPPORTED_MEDIA_TYPE = (415, "Unsupported Media Type");
    BAD_EXTENSION = (420, "Bad Extension");
    TEMPORARILY_UNAVAILABLE = (480, "Temporarily Unavailable");
    CALL_DOES_NOT_EXIST = (481, "Call/Transaction Does Not Exist");
    LOOP_DETECTED = (482, "Loop Detected");
    TOO_MANY_HOPS = (483, "Too Many Hops");
    ADDRESS_INCOMPLETE = (484, "Address Incomplete");
    AMBIGUOUS = (485, "Ambiguous");
    BUSY_HERE = (486, "Busy Here");
    REQUEST_CANCELLED = (487, "Request Cancelled");
    NOT_ACCEPTABLE_HERE = (488, "Not Acceptable Here");

    SERVER_INTERNAL_ERROR = (500, "Server Internal Error");
    NOT_IMPLEMENTED = (501, "Not Implemented");
    BAD_GATEWAY = (502, "Bad Gateway");
    SERVICE_UNAVAILABLE = (503, "Service Unavailable");
    GATEWAY_TIMEOUT = (504, "Gateway Time-out");
    VERSION_NOT_SUPPORTED = (505, "SIP Version Not Supported");

    BUSY_EVERYWHERE = (600, "Busy Everywhere");
    DECLINE = (603, "Decline");
    DOES_NOT_EXIST_ANYWHERE = (604, "Does Not Exist Anywhere");
    NOT_ACCEPTABLE_GLOBAL = (606, "Not Acceptable");
}

impl StatusCode {
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true for 1xx codes.
    pub fn is_provisional(&self) -> bool {
        (100..200).contains(&self.0)
    }

    /// Returns true for 2xx codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason())
    }
}
