//! 에러 타입 — 도메인별 에러 정의

/// Warden 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 아카이브 추출 에러
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 데이터셋 처리 중단 (추출 실패 등)
    #[error("dataset '{dataset}' aborted: {reason}")]
    DatasetAborted { dataset: String, reason: String },
}

/// 파싱 에러
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 지원하지 않는 형식
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// 파싱 실패
    #[error("parse failed at line {line}: {reason}")]
    Failed { line: usize, reason: String },

    /// 입력 데이터 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge { size: u64, max: u64 },
}

/// 아카이브 추출 에러
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// 손상된 아카이브 — 재시도해도 복구되지 않음
    #[error("corrupt archive '{path}': {reason}")]
    Corrupt { path: String, reason: String },

    /// 추출 중 I/O 실패
    #[error("extraction io error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// 재시도 한도 소진
    #[error("extraction of '{path}' failed after {attempts} attempts: {reason}")]
    RetriesExhausted {
        path: String,
        attempts: u32,
        reason: String,
    },
}

impl ExtractionError {
    /// 일시적(재시도 가능) 실패인지 판별합니다.
    ///
    /// 손상된 아카이브, 경로/권한 문제는 재시도해도 달라지지 않으므로
    /// I/O 에러 중 일시적 커널/디스크 상태에 해당하는 것만 재시도합니다.
    pub fn is_transient(&self) -> bool {
        use std::io::ErrorKind;

        match self {
            Self::Corrupt { .. } | Self::RetriesExhausted { .. } => false,
            Self::Io { source, .. } => !matches!(
                source.kind(),
                ErrorKind::NotFound
                    | ErrorKind::PermissionDenied
                    | ErrorKind::InvalidData
                    | ErrorKind::InvalidInput
                    | ErrorKind::UnexpectedEof
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn corrupt_archive_is_not_transient() {
        let err = ExtractionError::Corrupt {
            path: "/data/bad.zip".to_owned(),
            reason: "invalid central directory".to_owned(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn interrupted_io_is_transient() {
        let err = ExtractionError::Io {
            path: "/data/events.zip".to_owned(),
            source: io::Error::new(io::ErrorKind::Interrupted, "interrupted"),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn not_found_is_not_transient() {
        let err = ExtractionError::Io {
            path: "/data/missing.zip".to_owned(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn permission_denied_is_not_transient() {
        let err = ExtractionError::Io {
            path: "/data/events.zip".to_owned(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn extraction_error_display() {
        let err = ExtractionError::RetriesExhausted {
            path: "/data/events.zip".to_owned(),
            attempts: 4,
            reason: "disk timeout".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("events.zip"));
        assert!(msg.contains("4 attempts"));
        assert!(msg.contains("disk timeout"));
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::Failed {
            line: 42,
            reason: "unexpected character".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("unexpected character"));
    }

    #[test]
    fn errors_convert_to_warden_error() {
        let err: WardenError = ConfigError::ParseFailed {
            reason: "bad toml".to_owned(),
        }
        .into();
        assert!(matches!(err, WardenError::Config(_)));

        let err: WardenError = ExtractionError::Corrupt {
            path: "a.zip".to_owned(),
            reason: "bad".to_owned(),
        }
        .into();
        assert!(matches!(err, WardenError::Extraction(_)));
    }
}
