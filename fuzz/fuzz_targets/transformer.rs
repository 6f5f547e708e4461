#![no_main]

use libfuzzer_sys::fuzz_target;
use warden_ingest::transform::EventTransformer;

fuzz_target!(|data: &[u8]| {
    if let Ok(event) = serde_json::from_slice::<serde_json::Value>(data) {
        let transformer = EventTransformer::new();
        let flat = transformer.transform(&event, "fuzz-tenant", "fuzz-dataset");

        // raw_log는 항상 원본과 구조적으로 동일해야 함
        let restored: serde_json::Value =
            serde_json::from_str(&flat.raw_log).expect("raw_log must parse back");
        assert_eq!(restored, event);
    }
});
