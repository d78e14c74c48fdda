// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line parser for SDP bodies.
//!
//! Bodies arrive from hostile peers, so the parser is forgiving about layout
//! (percent-encoding, stray whitespace, mixed line endings) and strict only
//! about the `<type>=` prefix of each line.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use smol_str::SmolStr;

use crate::SdpMessage;

/// Error type for SDP parsing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SdpParseError {
    /// Line has fewer than two characters
    #[error("SDP line too short: {0:?}")]
    LineTooShort(String),
    /// Second character is not `=`
    #[error("invalid SDP line: {0:?}")]
    InvalidLine(String),
}

/// Parses an SDP body into session and media maps.
///
/// Empty or whitespace-only input yields an empty [`SdpMessage`].
pub fn parse(body: &str) -> Result<SdpMessage, SdpParseError> {
    let normalized = body.replace("\r\n", "\n").replace("\n\r", "\n");
    let decoded = percent_decode_str(&normalized).decode_utf8_lossy();

    let mut sdp = SdpMessage::default();
    let mut current: Option<HashMap<char, SmolStr>> = None;

    for line in decoded.trim().split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = split_line(line)?;
        if key == 'm' {
            if let Some(block) = current.take() {
                sdp.media.push(block);
            }
            current = Some(HashMap::new());
        }
        let target = current.as_mut().unwrap_or(&mut sdp.session);
        target.insert(key, SmolStr::new(value.trim()));
    }
    if let Some(block) = current {
        sdp.media.push(block);
    }

    Ok(sdp)
}

fn split_line(line: &str) -> Result<(char, &str), SdpParseError> {
    let mut chars = line.char_indices();
    let (Some((_, key)), Some((eq_at, eq))) = (chars.next(), chars.next()) else {
        return Err(SdpParseError::LineTooShort(line.to_owned()));
    };
    if eq != '=' {
        return Err(SdpParseError::InvalidLine(line.to_owned()));
    }
    Ok((key, &line[eq_at + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_and_media() {
        let msg = "v=0\no=Foo 123 456 IN IP4 1.1.1.1\ns=SDP test\n\
            i=Just a unit test\nu=http://voiphpc.blogspot.com\n\
            e=twu200@gmail.com\nt=112233 445566\n\
            m=audio 12345 RTP/AVP 0\na=rtpmap:0 PCMU/8000";
        let sdp = parse(msg).unwrap();

        assert_eq!(sdp.session_value('v'), Some("0"));
        assert!(sdp.session_value('o').unwrap().starts_with("Foo"));
        assert_eq!(sdp.session_value('s'), Some("SDP test"));
        assert_eq!(sdp.session_value('i'), Some("Just a unit test"));
        assert_eq!(sdp.session_value('u'), Some("http://voiphpc.blogspot.com"));
        assert_eq!(sdp.session_value('e'), Some("twu200@gmail.com"));
        assert_eq!(sdp.session_value('t'), Some("112233 445566"));
        assert_eq!(sdp.media.len(), 1);
        assert_eq!(sdp.media[0][&'m'], "audio 12345 RTP/AVP 0");
        assert_eq!(sdp.media[0][&'a'], "rtpmap:0 PCMU/8000");
    }

    #[test]
    fn empty_and_blank_bodies() {
        for body in ["", "  \n\r\n\r   \t\t   "] {
            let sdp = parse(body).unwrap();
            assert!(sdp.session.is_empty());
            assert!(sdp.media.is_empty());
        }
    }

    #[test]
    fn line_without_equals_is_invalid() {
        assert!(matches!(
            parse(&"\\".repeat(10)),
            Err(SdpParseError::InvalidLine(_))
        ));
    }

    #[test]
    fn single_character_line_is_too_short() {
        assert!(matches!(
            parse("v=0\nx\n"),
            Err(SdpParseError::LineTooShort(_))
        ));
    }

    #[test]
    fn each_m_line_opens_a_block() {
        let sdp = parse(
            "v=0\no=Foo\n\
             m=audio 12345 RTP/AVP 0\na=audioattribute\n\
             m=video 12346 RTP/AVP 0\na=videoattribute\n",
        )
        .unwrap();

        assert_eq!(sdp.session_value('o'), Some("Foo"));
        assert_eq!(sdp.media.len(), 2);
        assert!(sdp.media[0][&'m'].starts_with("audio"));
        assert_eq!(sdp.media[0][&'a'], "audioattribute");
        assert!(sdp.media[1][&'m'].starts_with("video"));
        assert_eq!(sdp.media[1][&'a'], "videoattribute");
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let sdp = parse("v=0\no=foo1\ns=test\ni=test\no=foo2\nt=12345\n").unwrap();
        assert_eq!(sdp.session_value('o'), Some("foo2"));
    }

    #[test]
    fn strips_whitespace_around_lines_and_values() {
        let sdp = parse(
            "v=0\n\t\t o=1 2 3 4 5 6\n   s=Subject  \t\ni= Info \n \t  m=audio 41000 RTP/AVP 0\t  \t",
        )
        .unwrap();

        assert_eq!(sdp.session_value('o'), Some("1 2 3 4 5 6"));
        assert_eq!(sdp.session_value('s'), Some("Subject"));
        assert_eq!(sdp.session_value('i'), Some("Info"));
        assert_eq!(sdp.media[0][&'m'], "audio 41000 RTP/AVP 0");
    }

    #[test]
    fn percent_encoded_body_is_decoded() {
        let sdp = parse("v=0%0As=Scanner%20session%0Am=audio%208000%20RTP/AVP%200").unwrap();
        assert_eq!(sdp.session_value('s'), Some("Scanner session"));
        assert_eq!(sdp.media[0][&'m'], "audio 8000 RTP/AVP 0");
    }
}
