//! 도메인 타입 — 수집 파이프라인 전역에서 사용되는 공통 타입
//!
//! 파일 단위 처리 결과([`FileResult`])와 데이터셋 단위 집계([`DatasetMetrics`]),
//! 그리고 JSON 레이아웃/처리 상태를 나타내는 태그 변형 타입을 정의합니다.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 파일의 JSON 레이아웃
///
/// 포맷 감지기가 파일당 한 번 판정하며, 스트리밍 파서의 전략 선택에 사용됩니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JsonFormat {
    /// 한 줄에 하나의 완전한 JSON 값 (newline-delimited JSON)
    Ndjson,
    /// 파일 전체가 단일 JSON 배열
    JsonArray,
    /// 일부 라인만 독립적인 JSON 값으로 파싱되는 혼합 형식
    Mixed,
    /// 판정 불가 (빈 파일, I/O 에러 포함)
    #[default]
    Unknown,
}

impl JsonFormat {
    /// 메트릭 레이블용 고정 문자열을 반환합니다.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Ndjson => "ndjson",
            Self::JsonArray => "json_array",
            Self::Mixed => "mixed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JsonFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// 파일 처리 종료 상태
///
/// 파일 스트림이 모두 소진된 뒤 한 번만 결정되는 종단 상태입니다.
/// 한 번 결정된 뒤에는 변경되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingStatus {
    /// 모든 이벤트 처리 성공
    Success,
    /// 일부 이벤트만 성공
    PartialSuccess,
    /// 처리된 이벤트 없음
    Failed,
    /// 크기 제한 초과 등으로 파싱 시도 없이 건너뜀
    Skipped,
}

impl ProcessingStatus {
    /// 메트릭 레이블용 고정 문자열을 반환합니다.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialSuccess => "partial_success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// 파일 단위 처리 결과
///
/// `process_file` 시작 시 생성되어 파싱/검증이 진행되는 동안 누적되고,
/// 상태가 확정된 뒤 데이터셋 집계([`DatasetMetrics::fold`])에 합산됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// 처리한 파일 경로
    pub path: PathBuf,
    /// 종료 상태
    pub status: ProcessingStatus,
    /// 변환까지 완료된 이벤트 수
    pub events_processed: u64,
    /// 파싱 또는 검증에 실패한 이벤트 수
    pub events_failed: u64,
    /// 파싱 에러 수
    pub parse_errors: u64,
    /// 검증 에러 수
    pub validation_errors: u64,
    /// 감지된 JSON 레이아웃
    pub detected_format: JsonFormat,
    /// 파일 단위 에러 요약 (있을 경우)
    pub error_message: Option<String>,
    /// 개별 에러 상세 (상한 개수까지만 유지)
    pub error_details: Vec<String>,
    /// 처리 소요 시간 (초)
    pub duration_secs: f64,
}

impl FileResult {
    /// `error_details`에 유지하는 최대 항목 수
    pub const MAX_ERROR_DETAILS: usize = 16;

    /// 새 파일 결과를 생성합니다. 상태는 확정 전까지 `Failed`입니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            status: ProcessingStatus::Failed,
            events_processed: 0,
            events_failed: 0,
            parse_errors: 0,
            validation_errors: 0,
            detected_format: JsonFormat::Unknown,
            error_message: None,
            error_details: Vec::new(),
            duration_secs: 0.0,
        }
    }

    /// 에러 상세를 상한까지만 추가합니다.
    pub fn push_error_detail(&mut self, detail: impl Into<String>) {
        if self.error_details.len() < Self::MAX_ERROR_DETAILS {
            self.error_details.push(detail.into());
        }
    }

    /// 누적 카운터로부터 종료 상태를 확정합니다.
    ///
    /// - 성공 이벤트만 있으면 `Success`
    /// - 성공/실패가 섞여 있으면 `PartialSuccess`
    /// - 성공 이벤트가 없으면 `Failed`
    ///
    /// `Skipped`는 파싱 시도 전에 오케스트레이터가 직접 지정하며
    /// 이 함수로 덮어쓰지 않습니다.
    pub fn resolve_status(&mut self) {
        if self.status == ProcessingStatus::Skipped {
            return;
        }
        self.status = if self.events_processed > 0 && self.events_failed == 0 {
            ProcessingStatus::Success
        } else if self.events_processed > 0 {
            ProcessingStatus::PartialSuccess
        } else {
            ProcessingStatus::Failed
        };
    }
}

impl fmt::Display for FileResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] format={} processed={} failed={} parse_errors={} validation_errors={}",
            self.path.display(),
            self.status,
            self.detected_format,
            self.events_processed,
            self.events_failed,
            self.parse_errors,
            self.validation_errors,
        )
    }
}

/// 데이터셋 단위 집계 카운터
///
/// `process_dataset` 호출당 하나가 생성되어 호출자에게 반환됩니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetMetrics {
    /// 처리 완료(성공/부분 성공)한 파일 수
    pub files_processed: u64,
    /// 실패한 파일 수
    pub files_failed: u64,
    /// 건너뛴 파일 수
    pub files_skipped: u64,
    /// 변환까지 완료된 이벤트 수
    pub events_processed: u64,
    /// 실패한 이벤트 수
    pub events_failed: u64,
    /// 파싱 에러 수
    pub parse_errors: u64,
    /// 검증 에러 수
    pub validation_errors: u64,
    /// 전체 처리 소요 시간 (초)
    pub processing_time_seconds: f64,
    /// 처리 완료한 데이터셋 수
    pub datasets_processed: u64,
    /// 실패한 데이터셋 수
    pub datasets_failed: u64,
}

impl DatasetMetrics {
    /// 파일 결과 하나를 집계에 합산합니다.
    pub fn fold(&mut self, result: &FileResult) {
        match result.status {
            ProcessingStatus::Success | ProcessingStatus::PartialSuccess => {
                self.files_processed += 1;
            }
            ProcessingStatus::Failed => self.files_failed += 1,
            ProcessingStatus::Skipped => self.files_skipped += 1,
        }
        self.events_processed += result.events_processed;
        self.events_failed += result.events_failed;
        self.parse_errors += result.parse_errors;
        self.validation_errors += result.validation_errors;
    }
}

impl fmt::Display for DatasetMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "files processed={} failed={} skipped={} | events processed={} failed={} \
             (parse_errors={} validation_errors={}) in {:.3}s",
            self.files_processed,
            self.files_failed,
            self.files_skipped,
            self.events_processed,
            self.events_failed,
            self.parse_errors,
            self.validation_errors,
            self.processing_time_seconds,
        )
    }
}
