#![no_main]
use libfuzzer_sys::fuzz_target;
use sip_parse::parse_message;

fuzz_target!(|data: &[u8]| {
    let _ = parse_message(data);
});
