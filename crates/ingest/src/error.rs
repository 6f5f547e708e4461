//! 수집 파이프라인 에러 타입
//!
//! [`IngestError`]는 수집 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<IngestError> for WardenError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 이벤트 단위의 파싱/검증 실패는 에러 타입으로 전파되지 않고
//! [`FileResult`](warden_core::types::FileResult) 카운터로만 보고됩니다.

use warden_core::error::{ExtractionError, ParseError, PipelineError, WardenError};

/// 수집 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// 파일 단위 파싱 중단 (개별 라인 에러가 아니라 파일 자체를 열거나
    /// 스트림을 구성하지 못한 경우)
    #[error("parse error: {format} in '{file}': {reason}")]
    Parse {
        /// 감지된 형식 (ndjson, json_array 등)
        format: String,
        /// 대상 파일
        file: String,
        /// 실패 사유
        reason: String,
    },

    /// 아카이브 추출 실패 (재시도 소진 포함)
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IngestError> for WardenError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Parse { reason, .. } => {
                WardenError::Parse(ParseError::Failed { line: 0, reason })
            }
            IngestError::Extraction(e) => WardenError::Extraction(e),
            IngestError::Config { field, reason } => {
                WardenError::Config(warden_core::error::ConfigError::InvalidValue {
                    field,
                    reason,
                })
            }
            IngestError::Io(e) => WardenError::Io(e),
        }
    }
}

impl IngestError {
    /// 데이터셋 중단 에러를 생성하는 헬퍼입니다.
    pub fn dataset_aborted(dataset: &str, reason: impl Into<String>) -> WardenError {
        WardenError::Pipeline(PipelineError::DatasetAborted {
            dataset: dataset.to_owned(),
            reason: reason.into(),
        })
    }
}
