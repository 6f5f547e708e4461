//! 설정 관리 — warden.toml 파싱 및 런타임 설정
//!
//! [`WardenConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`WARDEN_INGEST_MAX_RETRIES=5` 형식)
//! 2. 설정 파일 (`warden.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # fn example() -> Result<(), warden_core::error::WardenError> {
//! use warden_core::config::WardenConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = WardenConfig::load("warden.toml")?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = WardenConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, WardenError};

/// 검증이 활성화되었을 때 기본으로 요구하는 필드 목록
pub const DEFAULT_REQUIRED_FIELDS: &[&str] = &["timestamp", "source"];

/// Warden 통합 설정
///
/// `warden.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 수집 파이프라인 설정
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl WardenConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WardenError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WardenError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WardenError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                WardenError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, WardenError> {
        toml::from_str(toml_str).map_err(|e| {
            WardenError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `WARDEN_{SECTION}_{FIELD}`
    /// 예: `WARDEN_INGEST_MAX_RETRIES=5`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "WARDEN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "WARDEN_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.scratch_dir, "WARDEN_GENERAL_SCRATCH_DIR");

        // Ingest
        override_u64(
            &mut self.ingest.max_events_per_dataset,
            "WARDEN_INGEST_MAX_EVENTS_PER_DATASET",
        );
        override_u64(
            &mut self.ingest.max_events_per_file,
            "WARDEN_INGEST_MAX_EVENTS_PER_FILE",
        );
        override_usize(&mut self.ingest.batch_size, "WARDEN_INGEST_BATCH_SIZE");
        override_u64(
            &mut self.ingest.max_file_size_mb,
            "WARDEN_INGEST_MAX_FILE_SIZE_MB",
        );
        override_usize(
            &mut self.ingest.format_detection_lines,
            "WARDEN_INGEST_FORMAT_DETECTION_LINES",
        );
        override_bool(
            &mut self.ingest.enable_format_detection,
            "WARDEN_INGEST_ENABLE_FORMAT_DETECTION",
        );
        override_u64(
            &mut self.ingest.max_parse_errors_per_file,
            "WARDEN_INGEST_MAX_PARSE_ERRORS_PER_FILE",
        );
        override_bool(
            &mut self.ingest.continue_on_parse_errors,
            "WARDEN_INGEST_CONTINUE_ON_PARSE_ERRORS",
        );
        override_u32(&mut self.ingest.max_retries, "WARDEN_INGEST_MAX_RETRIES");
        override_u64(
            &mut self.ingest.retry_delay_base_ms,
            "WARDEN_INGEST_RETRY_DELAY_BASE_MS",
        );
        override_u64(
            &mut self.ingest.retry_delay_max_ms,
            "WARDEN_INGEST_RETRY_DELAY_MAX_MS",
        );
        override_bool(
            &mut self.ingest.enable_validation,
            "WARDEN_INGEST_ENABLE_VALIDATION",
        );
        override_csv(
            &mut self.ingest.required_fields,
            "WARDEN_INGEST_REQUIRED_FIELDS",
        );
        override_bool(
            &mut self.ingest.enable_metrics,
            "WARDEN_INGEST_ENABLE_METRICS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), WardenError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.general.scratch_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "general.scratch_dir".to_owned(),
                reason: "scratch_dir must not be empty".to_owned(),
            }
            .into());
        }

        self.ingest.validate()?;
        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 추출 임시 디렉토리 루트
    pub scratch_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            scratch_dir: std::env::temp_dir()
                .join("warden")
                .display()
                .to_string(),
        }
    }
}

/// 수집 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
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
    /// 파일당 허용하는 최대 파싱 에러 수 — 초과 시 강제 중단
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
    /// 검증 시 필수 필드 목록 — 설정된 값이 그대로 사용됩니다
    pub required_fields: Vec<String>,
    /// 메트릭 수집 활성화 여부
    pub enable_metrics: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_events_per_dataset: 1_000_000,
            max_events_per_file: 100_000,
            batch_size: 1000,
            max_file_size_mb: 100,
            format_detection_lines: 10,
            enable_format_detection: true,
            max_parse_errors_per_file: 100,
            continue_on_parse_errors: true,
            max_retries: 3,
            retry_delay_base_ms: 100,
            retry_delay_max_ms: 5000,
            enable_validation: true,
            required_fields: DEFAULT_REQUIRED_FIELDS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            enable_metrics: true,
        }
    }
}

impl IngestConfig {
    /// 수집 섹션 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), WardenError> {
        const MAX_BATCH_SIZE: usize = 1_000_000;
        const MAX_DETECTION_LINES: usize = 10_000;

        if self.max_events_per_dataset == 0 {
            return Err(invalid("ingest.max_events_per_dataset", "must be greater than 0"));
        }
        if self.max_events_per_file == 0 {
            return Err(invalid("ingest.max_events_per_file", "must be greater than 0"));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(invalid(
                "ingest.batch_size",
                &format!("must be 1-{MAX_BATCH_SIZE}"),
            ));
        }
        if self.max_file_size_mb == 0 {
            return Err(invalid("ingest.max_file_size_mb", "must be greater than 0"));
        }
        if self.format_detection_lines == 0 || self.format_detection_lines > MAX_DETECTION_LINES {
            return Err(invalid(
                "ingest.format_detection_lines",
                &format!("must be 1-{MAX_DETECTION_LINES}"),
            ));
        }
        if self.retry_delay_base_ms == 0 {
            return Err(invalid("ingest.retry_delay_base_ms", "must be greater than 0"));
        }
        if self.retry_delay_base_ms > self.retry_delay_max_ms {
            return Err(invalid(
                "ingest.retry_delay_base_ms",
                "must not exceed retry_delay_max_ms",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> WardenError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.to_owned(),
    }
    .into()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
