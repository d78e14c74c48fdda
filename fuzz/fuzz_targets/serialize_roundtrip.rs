#![no_main]
use libfuzzer_sys::fuzz_target;
use sip_parse::{parse_message, serialize_message};

fuzz_target!(|data: &[u8]| {
    if data.len() > 4096 {
        return;
    }

    // Anything that parses must serialize into something that parses again
    // with the same start line and headers.
    if let Ok(message) = parse_message(data) {
        let serialized = serialize_message(&message);
        let reparsed = parse_message(serialized.as_bytes()).expect("serialized message must parse");
        assert_eq!(message.kind, reparsed.kind);
        assert_eq!(message.headers, reparsed.headers);
    }
});
