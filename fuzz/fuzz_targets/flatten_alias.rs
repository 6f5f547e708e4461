#![no_main]

use libfuzzer_sys::fuzz_target;
use warden_ingest::transform::EventTransformer;

// 임의의 키 이름으로 구성한 단층 객체에서 별칭 매핑이 패닉 없이 동작하는지 확인
fuzz_target!(|keys: Vec<String>| {
    let mut object = serde_json::Map::new();
    for (i, key) in keys.into_iter().enumerate() {
        object.insert(key, serde_json::Value::from(i as u64));
    }
    let event = serde_json::Value::Object(object);
    let transformer = EventTransformer::new();
    let _ = transformer.transform(&event, "fuzz-tenant", "fuzz-dataset");
});
