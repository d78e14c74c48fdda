#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let body = String::from_utf8_lossy(data);
    if let Ok(sdp) = sip_sdp::parse(&body) {
        let _ = sdp.origin();
        let _ = sdp.audio_media();
    }
});
