//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 수집 파이프라인은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `warden_ingest_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(warden_core::metrics::EVENTS_PROCESSED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 데이터셋 레이블 키
pub const LABEL_DATASET: &str = "dataset";

/// 테넌트 레이블 키
pub const LABEL_TENANT: &str = "tenant";

/// 처리 상태 레이블 키 (success, partial_success, failed, skipped)
pub const LABEL_STATUS: &str = "status";

/// JSON 레이아웃 레이블 키 (ndjson, json_array, mixed, unknown)
pub const LABEL_FORMAT: &str = "format";

/// 파일 레이블 키
pub const LABEL_FILE: &str = "file";

/// 에러 유형 레이블 키 (malformed_line, array_decode, error_limit 등)
pub const LABEL_ERROR_TYPE: &str = "error_type";

/// 작업 단위 레이블 키 (process_file, process_dataset, extract)
pub const LABEL_OPERATION: &str = "operation";

// ─── Ingest 메트릭 ──────────────────────────────────────────────────

/// 변환까지 완료된 이벤트 수 (counter, labels: dataset, tenant, status)
pub const EVENTS_PROCESSED_TOTAL: &str = "warden_ingest_events_processed_total";

/// 실패한 이벤트 수 (counter, labels: dataset, tenant, status)
pub const EVENTS_FAILED_TOTAL: &str = "warden_ingest_events_failed_total";

/// 처리한 파일 수 (counter, labels: dataset, format, status)
pub const FILES_PROCESSED_TOTAL: &str = "warden_ingest_files_processed_total";

/// 파싱 에러 수 (counter, labels: dataset, file, error_type)
pub const PARSE_ERRORS_TOTAL: &str = "warden_ingest_parse_errors_total";

/// 처리 완료한 데이터셋 수 (counter, labels: dataset, tenant)
pub const DATASETS_PROCESSED_TOTAL: &str = "warden_ingest_datasets_processed_total";

/// 실패한 데이터셋 수 (counter, labels: dataset, tenant)
pub const DATASETS_FAILED_TOTAL: &str = "warden_ingest_datasets_failed_total";

/// 처리 소요 시간 (histogram, 초, labels: dataset, operation)
pub const PROCESSING_DURATION_SECONDS: &str = "warden_ingest_processing_duration_seconds";

/// 현재 처리 중인 파일 수 (gauge)
pub const FILES_IN_FLIGHT: &str = "warden_ingest_files_in_flight";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 처리 소요 시간 히스토그램 버킷 (초)
///
/// 1ms ~ 300s 범위, 로그 단위 분포 (아카이브 추출은 디스크 I/O 포함)
pub const PROCESSING_DURATION_BUCKETS: [f64; 10] =
    [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 10.0, 60.0, 300.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// `metrics::describe_counter!()`, `describe_gauge!()`, `describe_histogram!()`을
/// 호출하여 Prometheus HELP 텍스트를 설정합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        EVENTS_PROCESSED_TOTAL,
        "Total number of events transformed successfully"
    );
    describe_counter!(
        EVENTS_FAILED_TOTAL,
        "Total number of events dropped by parse or validation failures"
    );
    describe_counter!(
        FILES_PROCESSED_TOTAL,
        "Total number of dataset files scanned, by detected format and final status"
    );
    describe_counter!(
        PARSE_ERRORS_TOTAL,
        "Total number of parse failures, by file and error type"
    );
    describe_counter!(
        DATASETS_PROCESSED_TOTAL,
        "Total number of datasets ingested to completion"
    );
    describe_counter!(
        DATASETS_FAILED_TOTAL,
        "Total number of datasets aborted by extraction failure"
    );
    describe_histogram!(
        PROCESSING_DURATION_SECONDS,
        "Time to process one unit of work (file, dataset, extraction) in seconds"
    );
    describe_gauge!(
        FILES_IN_FLIGHT,
        "Number of files currently being processed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        EVENTS_PROCESSED_TOTAL,
        EVENTS_FAILED_TOTAL,
        FILES_PROCESSED_TOTAL,
        PARSE_ERRORS_TOTAL,
        DATASETS_PROCESSED_TOTAL,
        DATASETS_FAILED_TOTAL,
        PROCESSING_DURATION_SECONDS,
        FILES_IN_FLIGHT,
    ];

    #[test]
    fn all_metrics_start_with_warden_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("warden_ingest_"),
                "Metric '{}' does not start with 'warden_ingest_' prefix",
                name
            );
        }
    }

    #[test]
    fn counters_end_with_total() {
        for name in ALL_METRIC_NAMES
            .iter()
            .filter(|n| !n.ends_with("_seconds") && !n.ends_with("_in_flight"))
        {
            assert!(
                name.ends_with("_total"),
                "Counter '{}' should end with '_total'",
                name
            );
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        // describe_all() should not panic even without a recorder installed
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        let labels = [
            LABEL_DATASET,
            LABEL_TENANT,
            LABEL_STATUS,
            LABEL_FORMAT,
            LABEL_FILE,
            LABEL_ERROR_TYPE,
            LABEL_OPERATION,
        ];
        for label in &labels {
            assert_eq!(
                label.to_lowercase(),
                *label,
                "Label key '{}' should be lowercase",
                label
            );
        }
    }

    #[test]
    fn processing_duration_buckets_are_sorted() {
        let buckets = PROCESSING_DURATION_BUCKETS;
        for i in 1..buckets.len() {
            assert!(
                buckets[i] > buckets[i - 1],
                "Bucket values must be in ascending order"
            );
        }
    }
}
