#![no_main]

use libfuzzer_sys::fuzz_target;
use wordfind_client::protocol::ClientCommand;

fuzz_target!(|data: &[u8]| {
    // Anything that parses as a command must serialize back to a command
    // that parses the same way.
    if let Ok(command) = serde_json::from_slice::<ClientCommand>(data) {
        if let Ok(json) = serde_json::to_string(&command) {
            let reparsed = serde_json::from_str::<ClientCommand>(&json);
            assert!(matches!(reparsed, Ok(ref again) if *again == command));
        }
    }
});
