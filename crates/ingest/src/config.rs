//! 수집 파이프라인 설정
//!
//! [`IngestionConfig`]는 core의 [`IngestConfig`](warden_core::config::IngestConfig)를
//! 기반으로 파이프라인 전용 설정을 제공합니다. 파이프라인 인스턴스당 한 번
//! 생성되며 이후 변경되지 않습니다.
//!
//! # 사용 예시
//! ```ignore
//! use warden_core::config::WardenConfig;
//! use warden_ingest::config::IngestionConfig;
//!
//! let core_config = WardenConfig::default();
//! let config = IngestionConfig::from_core(&core_config);
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// 수집 파이프라인 설정
///
/// core의 `[ingest]` 섹션에서 파생되며, 추출 임시 디렉토리 루트 등
/// 파이프라인 내부에서 사용하는 추가 설정을 포함합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// 데이터셋당 처리할 최대 이벤트 수
    pub max_events_per_dataset: u64,
    /// 파일당 처리할 최대 라인/요소 수
    pub max_events_per_file: u64,
    /// 진행 로그를 남기는 이벤트 배치 크기
    pub batch_size: usize,
    /// 파일 크기 상한 (MB) — 초과 시 파싱 없이 건너뜀
    pub max_file_size_mb: u64,
    /// 포맷 감지 시 샘플링할 최대 라인 수
    pub format_detection_lines: usize,
    /// 포맷 감지 활성화 여부 (비활성 시 NDJSON 가정)
    pub enable_format_detection: bool,
    /// 파일당 허용하는 최대 파싱 에러 수
    pub max_parse_errors_per_file: u64,
    /// 파싱 에러 발생 시 계속 진행 여부
    pub continue_on_parse_errors: bool,
    /// 추출 재시도 횟수
    pub max_retries: u32,
    /// 재시도 백오프 기본 지연 (밀리초)
    pub retry_delay_base_ms: u64,
    /// 재시도 백오프 최대 지연 (밀리초)
    pub retry_delay_max_ms: u64,
    /// 스키마 검증 활성화 여부
    pub enable_validation: bool,
    /// 검증 시 필수 필드 목록
    ///
    /// 설정된 값이 그대로 사용됩니다. 기본값과의 병합은 없습니다.
    pub required_fields: Vec<String>,
    /// 메트릭 수집 활성화 여부
    pub enable_metrics: bool,

    // --- 확장 설정 (core [ingest] 섹션에 없는 추가 필드) ---
    /// 추출 임시 디렉토리 루트
    pub scratch_dir: PathBuf,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self::from_core(&warden_core::config::WardenConfig::default())
    }
}

impl IngestionConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    ///
    /// `[ingest]` 섹션을 그대로 복사하고, 임시 디렉토리 루트는
    /// `[general].scratch_dir`에서 가져옵니다.
    pub fn from_core(core: &warden_core::config::WardenConfig) -> Self {
        let ingest = &core.ingest;
        Self {
            max_events_per_dataset: ingest.max_events_per_dataset,
            max_events_per_file: ingest.max_events_per_file,
            batch_size: ingest.batch_size,
            max_file_size_mb: ingest.max_file_size_mb,
            format_detection_lines: ingest.format_detection_lines,
            enable_format_detection: ingest.enable_format_detection,
            max_parse_errors_per_file: ingest.max_parse_errors_per_file,
            continue_on_parse_errors: ingest.continue_on_parse_errors,
            max_retries: ingest.max_retries,
            retry_delay_base_ms: ingest.retry_delay_base_ms,
            retry_delay_max_ms: ingest.retry_delay_max_ms,
            enable_validation: ingest.enable_validation,
            required_fields: ingest.required_fields.clone(),
            enable_metrics: ingest.enable_metrics,
            scratch_dir: PathBuf::from(&core.general.scratch_dir),
        }
    }

    /// 파일 크기 상한을 바이트 단위로 반환합니다.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), IngestError> {
        const MAX_BATCH_SIZE: usize = 1_000_000;
        const MAX_DETECTION_LINES: usize = 10_000;

        if self.max_events_per_dataset == 0 {
            return Err(config_err("max_events_per_dataset", "must be greater than 0"));
        }
        if self.max_events_per_file == 0 {
            return Err(config_err("max_events_per_file", "must be greater than 0"));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(config_err(
                "batch_size",
                format!("must be 1-{MAX_BATCH_SIZE}"),
            ));
        }
        if self.max_file_size_mb == 0 {
            return Err(config_err("max_file_size_mb", "must be greater than 0"));
        }
        if self.format_detection_lines == 0 || self.format_detection_lines > MAX_DETECTION_LINES {
            return Err(config_err(
                "format_detection_lines",
                format!("must be 1-{MAX_DETECTION_LINES}"),
            ));
        }
        if self.retry_delay_base_ms == 0 {
            return Err(config_err("retry_delay_base_ms", "must be greater than 0"));
        }
        if self.retry_delay_base_ms > self.retry_delay_max_ms {
            return Err(config_err(
                "retry_delay_base_ms",
                "must not exceed retry_delay_max_ms",
            ));
        }
        if self.scratch_dir.as_os_str().is_empty() {
            return Err(config_err("scratch_dir", "must not be empty"));
        }
        Ok(())
    }
}

fn config_err(field: &str, reason: impl Into<String>) -> IngestError {
    IngestError::Config {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

/// 파이프라인 설정 빌더
///
/// 테스트와 임베딩 환경에서 개별 필드만 조정할 때 사용합니다.
#[derive(Default)]
pub struct IngestionConfigBuilder {
    config: IngestionConfig,
}

impl IngestionConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 데이터셋당 최대 이벤트 수를 설정합니다.
    pub fn max_events_per_dataset(mut self, max: u64) -> Self {
        self.config.max_events_per_dataset = max;
        self
    }

    /// 파일당 최대 라인/요소 수를 설정합니다.
    pub fn max_events_per_file(mut self, max: u64) -> Self {
        self.config.max_events_per_file = max;
        self
    }

    /// 진행 로그 배치 크기를 설정합니다.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// 파일 크기 상한(MB)을 설정합니다.
    pub fn max_file_size_mb(mut self, mb: u64) -> Self {
        self.config.max_file_size_mb = mb;
        self
    }

    /// 포맷 감지 샘플 라인 수를 설정합니다.
    pub fn format_detection_lines(mut self, lines: usize) -> Self {
        self.config.format_detection_lines = lines;
        self
    }

    /// 포맷 감지 활성화 여부를 설정합니다.
    pub fn enable_format_detection(mut self, enabled: bool) -> Self {
        self.config.enable_format_detection = enabled;
        self
    }

    /// 파일당 최대 파싱 에러 수를 설정합니다.
    pub fn max_parse_errors_per_file(mut self, max: u64) -> Self {
        self.config.max_parse_errors_per_file = max;
        self
    }

    /// 파싱 에러 시 계속 진행 여부를 설정합니다.
    pub fn continue_on_parse_errors(mut self, cont: bool) -> Self {
        self.config.continue_on_parse_errors = cont;
        self
    }

    /// 추출 재시도 횟수를 설정합니다.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// 재시도 백오프 지연 범위(밀리초)를 설정합니다.
    pub fn retry_delay_ms(mut self, base: u64, max: u64) -> Self {
        self.config.retry_delay_base_ms = base;
        self.config.retry_delay_max_ms = max;
        self
    }

    /// 검증 활성화 여부를 설정합니다.
    pub fn enable_validation(mut self, enabled: bool) -> Self {
        self.config.enable_validation = enabled;
        self
    }

    /// 필수 필드 목록을 설정합니다. 전달한 값이 그대로 사용됩니다.
    pub fn required_fields(mut self, fields: Vec<String>) -> Self {
        self.config.required_fields = fields;
        self
    }

    /// 메트릭 활성화 여부를 설정합니다.
    pub fn enable_metrics(mut self, enabled: bool) -> Self {
        self.config.enable_metrics = enabled;
        self
    }

    /// 추출 임시 디렉토리 루트를 설정합니다.
    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = dir.into();
        self
    }

    /// 설정을 검증하고 `IngestionConfig`를 생성합니다.
    pub fn build(self) -> Result<IngestionConfig, IngestError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
