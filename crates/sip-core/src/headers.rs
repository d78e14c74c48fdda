// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::slice::Iter;

use smol_str::SmolStr;

/// Closed set of header names the honeypot accepts.
///
/// Anything outside this set is rejected by the parser; a scanner sending
/// exotic extension headers is not a peer we need to understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeaderName {
    Accept,
    AcceptEncoding,
    AcceptLanguage,
    AlertInfo,
    Allow,
    AuthenticationInfo,
    Authorization,
    CallId,
    CallInfo,
    Contact,
    ContentDisposition,
    ContentEncoding,
    ContentLanguage,
    ContentLength,
    ContentType,
    CSeq,
    Date,
    ErrorInfo,
    Expires,
    From,
    InReplyTo,
    MaxForwards,
    MimeVersion,
    MinExpires,
    Organization,
    Priority,
    ProxyAuthenticate,
    ProxyAuthorization,
    ProxyRequire,
    RecordRoute,
    ReplyTo,
    Require,
    RetryAfter,
    Route,
    Server,
    Subject,
    Supported,
    Timestamp,
    To,
    Unsupported,
    UserAgent,
    Via,
    Warning,
    WwwAuthenticate,
}

/// Compact header forms (RFC 3261 §7.3.3) and the long names they expand to.
pub const COMPACT_FORMS: [(&str, HeaderName); 9] = [
    ("i", HeaderName::CallId),
    ("m", HeaderName::Contact),
    ("e", HeaderName::ContentEncoding),
    ("l", HeaderName::ContentLength),
    ("c", HeaderName::ContentType),
    ("f", HeaderName::From),
    ("s", HeaderName::Subject),
    ("t", HeaderName::To),
    ("v", HeaderName::Via),
];

pub const ALL: [HeaderName; 44] = [
    HeaderName::Accept,
    HeaderName::AcceptEncoding,
    HeaderName::AcceptLanguage,
    HeaderName::AlertInfo,
    HeaderName::Allow,
    HeaderName::AuthenticationInfo,
    HeaderName::Authorization,
    HeaderName::CallId,
    HeaderName::CallInfo,
    HeaderName::Contact,
    HeaderName::ContentDisposition,
    HeaderName::ContentEncoding,
    HeaderName::ContentLanguage,
    HeaderName::ContentLength,
    HeaderName::ContentType,
    HeaderName::CSeq,
    HeaderName::Date,
    HeaderName::ErrorInfo,
    HeaderName::Expires,
    HeaderName::From,
    HeaderName::InReplyTo,
    HeaderName::MaxForwards,
    HeaderName::MimeVersion,
    HeaderName::MinExpires,
    HeaderName::Organization,
    HeaderName::Priority,
    HeaderName::ProxyAuthenticate,
    HeaderName::ProxyAuthorization,
    HeaderName::ProxyRequire,
    HeaderName::RecordRoute,
    HeaderName::ReplyTo,
    HeaderName::Require,
    HeaderName::RetryAfter,
    HeaderName::Route,
    HeaderName::Server,
    HeaderName::Subject,
    HeaderName::Supported,
    HeaderName::Timestamp,
    HeaderName::To,
    HeaderName::Unsupported,
    HeaderName::UserAgent,
    HeaderName::Via,
    HeaderName::Warning,
    HeaderName::WwwAuthenticate,
];

impl HeaderName {
    /// Lower-case long name; this is the canonical key of a parsed header.
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderName::Accept => "accept",
            HeaderName::AcceptEncoding => "accept-encoding",
            HeaderName::AcceptLanguage => "accept-language",
            HeaderName::AlertInfo => "alert-info",
            HeaderName::Allow => "allow",
            HeaderName::AuthenticationInfo => "authentication-info",
            HeaderName::Authorization => "authorization",
            HeaderName::CallId => "call-id",
            HeaderName::CallInfo => "call-info",
            HeaderName::Contact => "contact",
            HeaderName::ContentDisposition => "content-disposition",
            HeaderName::ContentEncoding => "content-encoding",
            HeaderName::ContentLanguage => "content-language",
            HeaderName::ContentLength => "content-length",
            HeaderName::ContentType => "content-type",
            HeaderName::CSeq => "cseq",
            HeaderName::Date => "date",
            HeaderName::ErrorInfo => "error-info",
            HeaderName::Expires => "expires",
            HeaderName::From => "from",
            HeaderName::InReplyTo => "in-reply-to",
            HeaderName::MaxForwards => "max-forwards",
            HeaderName::MimeVersion => "mime-version",
            HeaderName::MinExpires => "min-expires",
            HeaderName::Organization => "organization",
            HeaderName::Priority => "priority",
            HeaderName::ProxyAuthenticate => "proxy-authenticate",
            HeaderName::ProxyAuthorization => "proxy-authorization",
            HeaderName::ProxyRequire => "proxy-require",
            HeaderName::RecordRoute => "record-route",
            HeaderName::ReplyTo => "reply-to",
            HeaderName::Require => "require",
            HeaderName::RetryAfter => "retry-after",
            HeaderName::Route => "route",
            HeaderName::Server => "server",
            HeaderName::Subject => "subject",
            HeaderName::Supported => "supported",
            HeaderName::Timestamp => "timestamp",
            HeaderName::To => "to",
            HeaderName::Unsupported => "unsupported",
            HeaderName::UserAgent => "user-agent",
            HeaderName::Via => "via",
            HeaderName::Warning => "warning",
            HeaderName::WwwAuthenticate => "www-authenticate",
        }
    }

    /// Wire spelling used when serializing.
    pub fn display_name(&self) -> &'static str {
        match self {
            HeaderName::Accept => "Accept",
            HeaderName::AcceptEncoding => "Accept-Encoding",
            HeaderName::AcceptLanguage => "Accept-Language",
            HeaderName::AlertInfo => "Alert-Info",
            HeaderName::Allow => "Allow",
            HeaderName::AuthenticationInfo => "Authentication-Info",
            HeaderName::Authorization => "Authorization",
            HeaderName::CallId => "Call-ID",
            HeaderName::CallInfo => "Call-Info",
            HeaderName::Contact => "Contact",
            HeaderName::ContentDisposition => "Content-Disposition",
            HeaderName::ContentEncoding => "Content-Encoding",
            HeaderName::ContentLanguage => "Content-Language",
            HeaderName::ContentLength => "Content-Length",
            HeaderName::ContentType => "Content-Type",
            HeaderName::CSeq => "CSeq",
            HeaderName::Date => "Date",
            HeaderName::ErrorInfo => "Error-Info",
            HeaderName::Expires => "Expires",
            HeaderName::From => "From",
            HeaderName::InReplyTo => "In-Reply-To",
            HeaderName::MaxForwards => "Max-Forwards",
            HeaderName::MimeVersion => "MIME-Version",
            HeaderName::MinExpires => "Min-Expires",
            HeaderName::Organization => "Organization",
            HeaderName::Priority => "Priority",
            HeaderName::ProxyAuthenticate => "Proxy-Authenticate",
            HeaderName::ProxyAuthorization => "Proxy-Authorization",
            HeaderName::ProxyRequire => "Proxy-Require",
            HeaderName::RecordRoute => "Record-Route",
            HeaderName::ReplyTo => "Reply-To",
            HeaderName::Require => "Require",
            HeaderName::RetryAfter => "Retry-After",
            HeaderName::Route => "Route",
            HeaderName::Server => "Server",
            HeaderName::Subject => "Subject",
            HeaderName::Supported => "Supported",
            HeaderName::Timestamp => "Timestamp",
            HeaderName::To => "To",
            HeaderName::Unsupported => "Unsupported",
            HeaderName::UserAgent => "User-Agent",
            HeaderName::Via => "Via",
            HeaderName::Warning => "Warning",
            HeaderName::WwwAuthenticate => "WWW-Authenticate",
        }
    }

    /// Resolves a header identifier in either long or compact form.
    ///
    /// Matching is case-insensitive. Returns `None` for names outside the
    /// recognized set.
    pub fn parse(identifier: &str) -> Option<Self> {
        let lower = identifier.trim().to_ascii_lowercase();
        if let Some((_, name)) = COMPACT_FORMS.iter().find(|(short, _)| *short == lower) {
            return Some(*name);
        }
        ALL.iter().copied().find(|name| name.as_str() == lower)
    }

    /// Single-letter form of this header, if it has one.
    pub fn compact_form(&self) -> Option<&'static str> {
        COMPACT_FORMS
            .iter()
            .find(|(_, name)| name == self)
            .map(|(short, _)| *short)
    }

    /// Only Via may legitimately appear more than once in our dialect.
    pub fn is_repeatable(&self) -> bool {
        matches!(self, HeaderName::Via)
    }
}

impl std::fmt::Display for HeaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a single SIP header field as a name/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: HeaderName,
    pub value: SmolStr,
}

/// Collection of SIP headers preserving first-insertion order.
///
/// Inserting a repeatable header (Via) appends another entry; inserting any
/// other header replaces the value already stored under that name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<Header>);

impl Headers {
    /// Creates an empty header collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a header, honoring the Via-accumulates / last-write-wins rule.
    pub fn insert(&mut self, name: HeaderName, value: impl Into<SmolStr>) {
        let value = value.into();
        if !name.is_repeatable() {
            if let Some(existing) = self.0.iter_mut().find(|h| h.name == name) {
                existing.value = value;
                return;
            }
        }
        self.0.push(Header { name, value });
    }

    /// Returns the value stored under `name`; for Via, the topmost entry.
    pub fn get(&self, name: HeaderName) -> Option<&SmolStr> {
        self.0.iter().find(|h| h.name == name).map(|h| &h.value)
    }

    /// Returns every value stored under `name`, in encounter order.
    pub fn get_all(&self, name: HeaderName) -> impl Iterator<Item = &SmolStr> + '_ {
        self.0
            .iter()
            .filter(move |h| h.name == name)
            .map(|h| &h.value)
    }

    /// All Via entries, topmost first.
    pub fn via(&self) -> Vec<&SmolStr> {
        self.get_all(HeaderName::Via).collect()
    }

    pub fn contains(&self, name: HeaderName) -> bool {
        self.0.iter().any(|h| h.name == name)
    }

    pub fn remove(&mut self, name: HeaderName) {
        self.0.retain(|h| h.name != name);
    }

    /// Returns an iterator over the stored headers.
    pub fn iter(&self) -> Iter<'_, Header> {
        self.0.iter()
    }

    /// Returns the number of header entries present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the collection does not contain any headers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
