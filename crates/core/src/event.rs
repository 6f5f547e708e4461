//! 정규화 이벤트 — 변환 완료된 평탄(flat) 이벤트의 표준 형태
//!
//! 수집 파이프라인의 변환기는 중첩된 원본 이벤트를 [`FlatEvent`]로 평탄화합니다.
//! 모든 `FlatEvent`는 다섯 개의 예약 키(테넌트, 데이터셋, 수집 시각, 이벤트 ID,
//! 원본 직렬화)를 항상 포함하며, `raw_log`에는 변환 전 원본이 그대로 보존되어
//! 변환 과정에서 정보가 손실되지 않습니다.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// --- 예약 키 상수 ---

/// 테넌트 ID 예약 키
pub const KEY_TENANT_ID: &str = "tenant_id";
/// 데이터셋 이름 예약 키
pub const KEY_DATASET_NAME: &str = "dataset_name";
/// 수집 시각 예약 키 (RFC 3339 UTC)
pub const KEY_INGESTION_TIMESTAMP: &str = "ingestion_timestamp";
/// 이벤트 고유 ID 예약 키 (UUID v4)
pub const KEY_EVENT_ID: &str = "event_id";
/// 원본 직렬화 예약 키
pub const KEY_RAW_LOG: &str = "raw_log";

/// 변환 완료된 평탄 이벤트
///
/// 다운스트림 룰 매칭이 기대하는 표준 출력 형태입니다.
/// 문자열 → 문자열 평탄 필드 맵과 다섯 개의 예약 필드로 구성됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatEvent {
    /// 이벤트를 소유한 테넌트 ID
    pub tenant_id: String,
    /// 이벤트가 속한 데이터셋 이름
    pub dataset_name: String,
    /// 수집 시각 (RFC 3339 UTC)
    pub ingestion_timestamp: String,
    /// 이벤트 고유 ID (UUID v4)
    pub event_id: String,
    /// 변환 전 원본의 JSON 직렬화
    pub raw_log: String,
    /// 평탄화된 필드 (예약 키 제외)
    pub fields: BTreeMap<String, String>,
}

impl FlatEvent {
    /// 예약 필드만 채워진 빈 이벤트를 생성합니다.
    pub fn new(
        tenant_id: impl Into<String>,
        dataset_name: impl Into<String>,
        ingestion_timestamp: impl Into<String>,
        raw_log: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            dataset_name: dataset_name.into(),
            ingestion_timestamp: ingestion_timestamp.into(),
            event_id: uuid::Uuid::new_v4().to_string(),
            raw_log: raw_log.into(),
            fields: BTreeMap::new(),
        }
    }

    /// 평탄 필드를 기록합니다. 같은 키가 이미 있으면 덮어씁니다.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// 평탄 필드 값을 조회합니다. 예약 키도 조회 대상에 포함됩니다.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            KEY_TENANT_ID => Some(&self.tenant_id),
            KEY_DATASET_NAME => Some(&self.dataset_name),
            KEY_INGESTION_TIMESTAMP => Some(&self.ingestion_timestamp),
            KEY_EVENT_ID => Some(&self.event_id),
            KEY_RAW_LOG => Some(&self.raw_log),
            _ => self.fields.get(key).map(String::as_str),
        }
    }

    /// 평탄 필드 수를 반환합니다 (예약 키 제외).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 평탄 필드가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 평탄 필드 이터레이터를 반환합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.fields.iter()
    }
}

impl fmt::Display for FlatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FlatEvent[{}] tenant={} dataset={} fields={}",
            &self.event_id[..8.min(self.event_id.len())],
            self.tenant_id,
            self.dataset_name,
            self.fields.len(),
        )
    }
}
