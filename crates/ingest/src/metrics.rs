//! 메트릭 수집 구현 — 레코더 구현과 no-op 구현
//!
//! [`MetricsSink`] trait의 두 구현을 제공합니다. `enable_metrics` 설정에
//! 따라 [`sink_for`]가 구현을 선택하며, 어느 쪽을 쓰더라도 파이프라인의
//! 제어 흐름은 달라지지 않습니다.

use std::sync::Arc;

use metrics::{counter, gauge, histogram};

use warden_core::metrics as names;
use warden_core::pipeline::MetricsSink;
use warden_core::types::{JsonFormat, ProcessingStatus};

use crate::config::IngestionConfig;

/// 변환 완료 이벤트의 상태 레이블
pub const STATUS_PROCESSED: &str = "processed";
/// 파싱 실패 이벤트의 상태 레이블
pub const STATUS_PARSE_ERROR: &str = "parse_error";
/// 검증 실패 이벤트의 상태 레이블
pub const STATUS_VALIDATION_ERROR: &str = "validation_error";

/// 설정에 따라 메트릭 구현을 선택합니다.
pub fn sink_for(config: &IngestionConfig) -> Arc<dyn MetricsSink> {
    if config.enable_metrics {
        Arc::new(RecorderSink)
    } else {
        Arc::new(NoopSink)
    }
}

/// 전역 레코더로 기록하는 메트릭 구현
///
/// `metrics` 파사드 매크로를 통해 기록하므로, 외부에서 설치한
/// 레코더(Prometheus 등)가 있으면 그쪽으로 수집됩니다.
pub struct RecorderSink;

impl MetricsSink for RecorderSink {
    fn event(&self, dataset: &str, tenant: &str, status: &str) {
        let name = if status == STATUS_PROCESSED {
            names::EVENTS_PROCESSED_TOTAL
        } else {
            names::EVENTS_FAILED_TOTAL
        };
        counter!(
            name,
            names::LABEL_DATASET => dataset.to_owned(),
            names::LABEL_TENANT => tenant.to_owned(),
            names::LABEL_STATUS => status.to_owned()
        )
        .increment(1);
    }

    fn file(&self, dataset: &str, format: JsonFormat, status: ProcessingStatus) {
        counter!(
            names::FILES_PROCESSED_TOTAL,
            names::LABEL_DATASET => dataset.to_owned(),
            names::LABEL_FORMAT => format.as_label(),
            names::LABEL_STATUS => status.as_label()
        )
        .increment(1);
    }

    fn parse_error(&self, dataset: &str, file: &str, error_type: &str) {
        counter!(
            names::PARSE_ERRORS_TOTAL,
            names::LABEL_DATASET => dataset.to_owned(),
            names::LABEL_FILE => file.to_owned(),
            names::LABEL_ERROR_TYPE => error_type.to_owned()
        )
        .increment(1);
    }

    fn dataset(&self, dataset: &str, tenant: &str, success: bool) {
        let name = if success {
            names::DATASETS_PROCESSED_TOTAL
        } else {
            names::DATASETS_FAILED_TOTAL
        };
        counter!(
            name,
            names::LABEL_DATASET => dataset.to_owned(),
            names::LABEL_TENANT => tenant.to_owned()
        )
        .increment(1);
    }

    fn duration(&self, dataset: &str, operation: &str, seconds: f64) {
        histogram!(
            names::PROCESSING_DURATION_SECONDS,
            names::LABEL_DATASET => dataset.to_owned(),
            names::LABEL_OPERATION => operation.to_owned()
        )
        .record(seconds);
    }

    fn files_in_flight_add(&self, delta: i64) {
        gauge!(names::FILES_IN_FLIGHT).increment(delta as f64);
    }
}

/// 아무것도 기록하지 않는 구현
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn event(&self, _dataset: &str, _tenant: &str, _status: &str) {}
    fn file(&self, _dataset: &str, _format: JsonFormat, _status: ProcessingStatus) {}
    fn parse_error(&self, _dataset: &str, _file: &str, _error_type: &str) {}
    fn dataset(&self, _dataset: &str, _tenant: &str, _success: bool) {}
    fn duration(&self, _dataset: &str, _operation: &str, _seconds: f64) {}
    fn files_in_flight_add(&self, _delta: i64) {}
}

/// 처리 중 파일 게이지의 스코프 가드
///
/// 생성 시 게이지를 올리고 드롭 시 내립니다. 패닉을 포함한 모든
/// 종료 경로에서 반환이 보장됩니다.
pub struct InFlightGuard {
    sink: Arc<dyn MetricsSink>,
}

impl InFlightGuard {
    /// 게이지를 올리고 가드를 생성합니다.
    pub fn new(sink: Arc<dyn MetricsSink>) -> Self {
        sink.files_in_flight_add(1);
        Self { sink }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.sink.files_in_flight_add(-1);
    }
}
