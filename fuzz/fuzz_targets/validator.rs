#![no_main]

use libfuzzer_sys::fuzz_target;
use warden_ingest::validator::EventValidator;

fuzz_target!(|data: &[u8]| {
    if let Ok(event) = serde_json::from_slice::<serde_json::Value>(data) {
        let validator = EventValidator::new(
            true,
            vec!["timestamp".to_owned(), "source".to_owned()],
        );
        let _ = validator.validate(&event);
    }
});
