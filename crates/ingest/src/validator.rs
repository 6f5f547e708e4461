//! 이벤트 검증기 — 최소 스키마 요구사항 확인
//!
//! 파싱된 이벤트 하나에 대해 필수 필드 존재 여부를 확인합니다.
//! 검증 실패는 카운터로만 보고되며, 절대 에러로 전파되지 않습니다.

use serde_json::Value;

use crate::config::IngestionConfig;

/// 단일 이벤트의 검증 결과
#[derive(Debug, Clone)]
pub struct Validation {
    /// 검증 통과 여부
    pub is_valid: bool,
    /// 실패 사유 목록 (통과 시 비어 있음)
    pub errors: Vec<String>,
}

impl Validation {
    fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    fn invalid(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
        }
    }
}

/// 필수 필드 검증기
///
/// `enable_validation`이 꺼져 있으면 모든 이벤트를 통과시킵니다.
/// 켜져 있으면 이벤트가 비어 있지 않은 JSON 객체인지, 그리고
/// `required_fields`의 모든 이름이 최상위 키로 존재하는지 확인합니다.
#[derive(Debug, Clone)]
pub struct EventValidator {
    enabled: bool,
    required_fields: Vec<String>,
}

impl EventValidator {
    /// 새 검증기를 생성합니다.
    pub fn new(enabled: bool, required_fields: Vec<String>) -> Self {
        Self {
            enabled,
            required_fields,
        }
    }

    /// 파이프라인 설정에서 검증기를 구성합니다.
    pub fn from_config(config: &IngestionConfig) -> Self {
        Self::new(config.enable_validation, config.required_fields.clone())
    }

    /// 이벤트 하나를 검증합니다. 절대 실패를 전파하지 않습니다.
    pub fn validate(&self, event: &Value) -> Validation {
        if !self.enabled {
            return Validation::valid();
        }

        let Some(object) = event.as_object() else {
            return Validation::invalid(vec!["event is empty or not an object".to_owned()]);
        };
        if object.is_empty() {
            return Validation::invalid(vec!["event is empty or not an object".to_owned()]);
        }

        let missing: Vec<&str> = self
            .required_fields
            .iter()
            .filter(|field| !object.contains_key(field.as_str()))
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Validation::valid()
        } else {
            Validation::invalid(vec![format!(
                "missing required fields: {}",
                missing.join(", ")
            )])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator(fields: &[&str]) -> EventValidator {
        EventValidator::new(true, fields.iter().map(|s| (*s).to_owned()).collect())
    }

    #[test]
    fn valid_event_passes() {
        let v = validator(&["timestamp", "source"]);
        let event = json!({"timestamp": "2024-01-15T12:00:00Z", "source": "auth", "extra": 1});
        let result = v.validate(&event);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn missing_fields_are_enumerated_by_name() {
        let v = validator(&["timestamp", "source"]);
        let event = json!({"host": "web-01"});
        let result = v.validate(&event);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0], "missing required fields: timestamp, source");
    }

    #[test]
    fn partially_missing_fields() {
        let v = validator(&["timestamp", "source"]);
        let event = json!({"timestamp": "now"});
        let result = v.validate(&event);
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("source"));
        assert!(!result.errors[0].contains("timestamp,"));
    }

    #[test]
    fn empty_object_is_invalid() {
        let v = validator(&[]);
        let result = v.validate(&json!({}));
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("empty"));
    }

    #[test]
    fn non_object_is_invalid() {
        let v = validator(&[]);
        assert!(!v.validate(&json!([1, 2, 3])).is_valid);
        assert!(!v.validate(&json!(42)).is_valid);
        assert!(!v.validate(&json!(null)).is_valid);
    }

    #[test]
    fn field_match_is_exact_case_sensitive() {
        let v = validator(&["timestamp"]);
        let event = json!({"Timestamp": "2024-01-15T12:00:00Z"});
        assert!(!v.validate(&event).is_valid);
    }

    #[test]
    fn null_valued_field_still_counts_as_present() {
        // 존재 여부만 확인하며 값은 검사하지 않음
        let v = validator(&["timestamp"]);
        let event = json!({"timestamp": null});
        assert!(v.validate(&event).is_valid);
    }

    #[test]
    fn disabled_validator_accepts_everything() {
        let v = EventValidator::new(false, vec!["timestamp".to_owned()]);
        assert!(v.validate(&json!({})).is_valid);
        assert!(v.validate(&json!(null)).is_valid);
        assert!(v.validate(&json!({"other": 1})).is_valid);
    }

    #[test]
    fn empty_required_fields_only_checks_emptiness() {
        let v = validator(&[]);
        assert!(v.validate(&json!({"anything": 1})).is_valid);
        assert!(!v.validate(&json!({})).is_valid);
    }
}
