//! 이벤트 변환기 — 중첩 구조 평탄화 및 표준 별칭 매핑
//!
//! 파싱된 원본 이벤트를 다운스트림 룰 매칭이 기대하는 [`FlatEvent`]로
//! 변환합니다. 변환은 입력에 대한 순수 함수이며 항상 성공합니다.
//!
//! # 평탄화 규칙
//! - 중첩 객체 키는 `.`으로 연결 (`http.method`)
//! - 배열은 요소별 인덱스 키(`items[0]`)와, 인덱스 없는 키에 배열 전체의
//!   JSON 직렬화를 함께 기록
//! - 스칼라는 문자열화, null은 빈 문자열
//! - 원본은 `raw_log`에 그대로 직렬화되어 보존 — 변환으로 정보가
//!   손실되지 않음

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use warden_core::event::FlatEvent;

/// 표준 별칭 테이블 — 알려진 동의어 필드명을 고정된 출력 키로 매핑
///
/// 스칼라 리프의 직접 키(중첩 경로의 마지막 구획)를 대소문자 구분 없이
/// 비교합니다. 입력 객체는 삽입 순서대로 순회되므로 한 이벤트 안에서
/// 같은 표준 키에 대한 동의어가 여러 개면 마지막 항목이 남습니다.
const CANONICAL_ALIASES: &[(&[&str], &str)] = &[
    (&["processname", "process_name", "image"], "ProcessName"),
    (&["commandline", "command_line", "cmdline"], "CommandLine"),
    (&["user", "username", "account"], "User"),
    (&["eventid", "event_id", "id"], "EventID"),
];

/// 동의어 테이블에서 표준 키를 찾습니다.
fn canonical_alias(key: &str) -> Option<&'static str> {
    let lowered = key.to_lowercase();
    CANONICAL_ALIASES
        .iter()
        .find(|(synonyms, _)| synonyms.contains(&lowered.as_str()))
        .map(|(_, canonical)| *canonical)
}

/// 이벤트 변환기
#[derive(Debug, Clone, Default)]
pub struct EventTransformer;

impl EventTransformer {
    /// 새 변환기를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 원본 이벤트 하나를 평탄 이벤트로 변환합니다.
    pub fn transform(&self, event: &Value, tenant_id: &str, dataset_name: &str) -> FlatEvent {
        let raw_log = serde_json::to_string(event).unwrap_or_default();
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let mut flat = FlatEvent::new(tenant_id, dataset_name, timestamp, raw_log);

        if let Some(object) = event.as_object() {
            for (key, value) in object {
                flatten_into(&mut flat, key, value);
            }
        }
        flat
    }
}

/// 값 하나를 `key` 아래에 재귀적으로 평탄화합니다.
fn flatten_into(flat: &mut FlatEvent, key: &str, value: &Value) {
    match value {
        Value::Object(object) => {
            for (child_key, child_value) in object {
                let joined = format!("{key}.{child_key}");
                flatten_into(flat, &joined, child_value);
            }
        }
        Value::Array(elements) => {
            // 인덱스 없는 키에는 배열 전체를 JSON 문자열로 기록
            if let Ok(serialized) = serde_json::to_string(elements) {
                flat.insert(key, serialized);
            }
            for (i, element) in elements.iter().enumerate() {
                let indexed = format!("{key}[{i}]");
                flatten_into(flat, &indexed, element);
            }
        }
        scalar => {
            let stringified = stringify_scalar(scalar);
            // 표준 별칭은 직접 키(마지막 경로 구획)로 판정
            let leaf = key.rsplit('.').next().unwrap_or(key);
            if let Some(canonical) = canonical_alias(leaf) {
                flat.insert(canonical, stringified.clone());
            }
            flat.insert(key, stringified);
        }
    }
}

/// 스칼라 값을 문자열로 변환합니다. null은 빈 문자열이 됩니다.
fn stringify_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // flatten_into에서 객체/배열은 앞서 처리됨
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_core::event::{KEY_EVENT_ID, KEY_RAW_LOG};

    fn transform(event: &Value) -> FlatEvent {
        EventTransformer::new().transform(event, "tenant-01", "auth-logs")
    }

    #[test]
    fn reserved_keys_always_set() {
        let flat = transform(&json!({"a": 1}));
        assert_eq!(flat.tenant_id, "tenant-01");
        assert_eq!(flat.dataset_name, "auth-logs");
        assert!(!flat.ingestion_timestamp.is_empty());
        assert!(flat.get(KEY_EVENT_ID).is_some());
        assert!(flat.get(KEY_RAW_LOG).is_some());
    }

    #[test]
    fn ingestion_timestamp_is_rfc3339_utc() {
        let flat = transform(&json!({"a": 1}));
        let parsed = chrono::DateTime::parse_from_rfc3339(&flat.ingestion_timestamp);
        assert!(parsed.is_ok());
        assert!(flat.ingestion_timestamp.ends_with('Z'));
    }

    #[test]
    fn raw_log_round_trips_to_original() {
        let original = json!({
            "timestamp": "2024-01-15T12:00:00Z",
            "nested": {"deep": {"value": 42}},
            "tags": ["a", "b"],
            "missing": null
        });
        let flat = transform(&original);
        let restored: Value = serde_json::from_str(&flat.raw_log).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn scalars_are_stringified() {
        let flat = transform(&json!({"count": 42, "ratio": 2.5, "active": true, "name": "web"}));
        assert_eq!(flat.get("count"), Some("42"));
        assert_eq!(flat.get("ratio"), Some("2.5"));
        assert_eq!(flat.get("active"), Some("true"));
        assert_eq!(flat.get("name"), Some("web"));
    }

    #[test]
    fn null_becomes_empty_string() {
        let flat = transform(&json!({"gone": null}));
        assert_eq!(flat.get("gone"), Some(""));
    }

    #[test]
    fn nested_objects_join_with_dot() {
        let flat = transform(&json!({"http": {"request": {"method": "POST"}}}));
        assert_eq!(flat.get("http.request.method"), Some("POST"));
    }

    #[test]
    fn arrays_produce_indexed_keys_and_serialized_whole() {
        let flat = transform(&json!({"tags": ["auth", "ssh"]}));
        assert_eq!(flat.get("tags[0]"), Some("auth"));
        assert_eq!(flat.get("tags[1]"), Some("ssh"));
        assert_eq!(flat.get("tags"), Some(r#"["auth","ssh"]"#));
    }

    #[test]
    fn array_of_objects_flattens_recursively() {
        let flat = transform(&json!({"conns": [{"port": 22}, {"port": 443}]}));
        assert_eq!(flat.get("conns[0].port"), Some("22"));
        assert_eq!(flat.get("conns[1].port"), Some("443"));
        assert!(flat.get("conns").unwrap().starts_with('['));
    }

    #[test]
    fn canonical_alias_for_user_synonyms() {
        let flat = transform(&json!({"username": "root"}));
        assert_eq!(flat.get("User"), Some("root"));
        assert_eq!(flat.get("username"), Some("root"));
    }

    #[test]
    fn canonical_alias_is_case_insensitive() {
        let flat = transform(&json!({"CommandLine": "/bin/sh -c id"}));
        assert_eq!(flat.get("CommandLine"), Some("/bin/sh -c id"));

        let flat = transform(&json!({"CMDLINE": "/bin/true"}));
        assert_eq!(flat.get("CommandLine"), Some("/bin/true"));
    }

    #[test]
    fn last_synonym_wins_within_one_event() {
        // preserve_order 덕분에 객체 순회가 삽입 순서를 따름
        let event: Value =
            serde_json::from_str(r#"{"user": "first", "account": "second"}"#).unwrap();
        let flat = transform(&event);
        assert_eq!(flat.get("User"), Some("second"));
        assert_eq!(flat.get("user"), Some("first"));
        assert_eq!(flat.get("account"), Some("second"));
    }

    #[test]
    fn alias_matches_leaf_of_nested_path() {
        let flat = transform(&json!({"process": {"image": "/usr/bin/sshd"}}));
        assert_eq!(flat.get("process.image"), Some("/usr/bin/sshd"));
        assert_eq!(flat.get("ProcessName"), Some("/usr/bin/sshd"));
    }

    #[test]
    fn eventid_synonyms_alias() {
        let flat = transform(&json!({"event_id": 4625}));
        assert_eq!(flat.get("EventID"), Some("4625"));
    }

    #[test]
    fn non_object_input_keeps_only_reserved_keys() {
        let flat = transform(&json!([1, 2, 3]));
        assert!(flat.is_empty());
        let restored: Value = serde_json::from_str(&flat.raw_log).unwrap();
        assert_eq!(restored, json!([1, 2, 3]));
    }

    #[test]
    fn distinct_transforms_generate_distinct_event_ids() {
        let event = json!({"a": 1});
        let first = transform(&event);
        let second = transform(&event);
        assert_ne!(first.event_id, second.event_id);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arbitrary_json(depth: u32) -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::from),
                any::<i64>().prop_map(Value::from),
                "[a-zA-Z0-9 ]{0,16}".prop_map(Value::from),
            ];
            leaf.prop_recursive(depth, 64, 8, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..8).prop_map(Value::from),
                    prop::collection::btree_map("[a-z_]{1,8}", inner, 0..8)
                        .prop_map(|m| Value::Object(m.into_iter().collect())),
                ]
            })
        }

        proptest! {
            #[test]
            fn transform_never_panics(event in arbitrary_json(4)) {
                let _ = EventTransformer::new().transform(&event, "t", "d");
            }

            #[test]
            fn raw_log_always_round_trips(event in arbitrary_json(4)) {
                let flat = EventTransformer::new().transform(&event, "t", "d");
                let restored: Value = serde_json::from_str(&flat.raw_log).unwrap();
                prop_assert_eq!(restored, event);
            }
        }
    }
}
