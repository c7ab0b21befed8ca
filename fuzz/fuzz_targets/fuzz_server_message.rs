#![no_main]

use libfuzzer_sys::fuzz_target;
use wordfind_client::protocol::ServerMessage;

fuzz_target!(|data: &[u8]| {
    // Raw-byte path, including serde_json's UTF-8 validation.
    let _ = serde_json::from_slice::<ServerMessage>(data);

    // Full decode: parsing plus grid and solution-path validation.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(message) = ServerMessage::from_json(s) {
            let _ = message.into_events();
        }
    }
});
