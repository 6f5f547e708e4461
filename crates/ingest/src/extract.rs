//! 아카이브 추출기 — 재시도 백오프가 적용된 zip/gzip/raw 추출
//!
//! 데이터셋 아카이브를 호출 단위 고유 이름의 임시 디렉토리에 풀어놓습니다.
//! 일시적 I/O 실패만 지수 백오프로 재시도하며, 손상된 아카이브는 즉시
//! 실패합니다. 재시도 소진 후의 실패는 데이터셋 전체를 중단시키는
//! 유일한 실패 유형입니다.
//!
//! [`ScratchDir`]는 추출 디렉토리의 소유권을 갖는 RAII 가드로,
//! 드롭 시 디렉토리 트리를 제거하여 모든 종료 경로에서 정리를 보장합니다.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use warden_core::error::ExtractionError;

use crate::config::IngestionConfig;

/// 지수 백오프 재시도 정책
///
/// `delay_for(attempt)`는 `base * 2^attempt`를 `max`로 상한합니다.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 재시도 횟수 (최초 시도 제외)
    pub attempts: u32,
    /// 기본 지연
    pub base: Duration,
    /// 지연 상한
    pub max: Duration,
}

impl RetryPolicy {
    /// 새 정책을 생성합니다.
    pub const fn new(attempts: u32, base: Duration, max: Duration) -> Self {
        Self { attempts, base, max }
    }

    /// 파이프라인 설정에서 정책을 구성합니다.
    pub fn from_config(config: &IngestionConfig) -> Self {
        Self {
            attempts: config.max_retries,
            base: Duration::from_millis(config.retry_delay_base_ms),
            max: Duration::from_millis(config.retry_delay_max_ms),
        }
    }

    /// `attempt`번째 재시도 전 대기 시간을 계산합니다.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = u64::try_from(self.base.as_millis()).unwrap_or(u64::MAX);
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let scaled = base_ms.saturating_mul(factor);
        let max_ms = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(scaled.min(max_ms))
    }
}

/// 추출 디렉토리의 RAII 소유권
///
/// 하나의 `process_dataset` 호출이 독점 소유하며, 드롭 시 디렉토리가
/// 제거됩니다. 성공/파일 실패/추출 실패 어느 경로로 빠져나가더라도
/// 정리가 보장됩니다.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// 추출된 디렉토리 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove scratch dir");
            }
        }
    }
}

/// 아카이브 추출기
///
/// 확장자에 따라 전략을 선택합니다:
/// - `.zip`: 아카이브 전체 추출
/// - `.gz`: 단일 파일 압축 해제
/// - 그 외: 임시 디렉토리로 원본 복사
pub struct Extractor {
    scratch_root: PathBuf,
    policy: RetryPolicy,
}

impl Extractor {
    /// 새 추출기를 생성합니다.
    pub fn new(scratch_root: impl Into<PathBuf>, policy: RetryPolicy) -> Self {
        Self {
            scratch_root: scratch_root.into(),
            policy,
        }
    }

    /// 파이프라인 설정에서 추출기를 구성합니다.
    pub fn from_config(config: &IngestionConfig) -> Self {
        Self::new(config.scratch_dir.clone(), RetryPolicy::from_config(config))
    }

    /// 아카이브를 호출 단위 고유 임시 디렉토리에 추출합니다.
    ///
    /// 일시적 I/O 실패는 백오프와 함께 재시도되고, 실패한 시도의
    /// 부분 생성 디렉토리는 즉시 제거됩니다.
    pub fn extract(&self, archive: &Path) -> Result<ScratchDir, ExtractionError> {
        let stem = archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_owned());

        let mut attempt: u32 = 0;
        loop {
            let dest = self
                .scratch_root
                .join(format!("{stem}-{}", uuid::Uuid::new_v4()));

            match self.extract_once(archive, &dest) {
                Ok(()) => {
                    debug!(
                        archive = %archive.display(),
                        dest = %dest.display(),
                        "archive extracted"
                    );
                    return Ok(ScratchDir { path: dest });
                }
                Err(e) => {
                    // 실패한 시도의 부분 결과물은 남기지 않음
                    let _ = fs::remove_dir_all(&dest);

                    if e.is_transient() && attempt < self.policy.attempts {
                        let delay = self.policy.delay_for(attempt);
                        warn!(
                            archive = %archive.display(),
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "transient extraction failure, retrying"
                        );
                        std::thread::sleep(delay);
                        attempt += 1;
                        continue;
                    }

                    if e.is_transient() {
                        return Err(ExtractionError::RetriesExhausted {
                            path: archive.display().to_string(),
                            attempts: attempt + 1,
                            reason: e.to_string(),
                        });
                    }
                    return Err(e);
                }
            }
        }
    }

    fn extract_once(&self, archive: &Path, dest: &Path) -> Result<(), ExtractionError> {
        fs::create_dir_all(dest).map_err(|e| io_err(dest, e))?;

        let extension = archive
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        match extension.as_deref() {
            Some("zip") => self.extract_zip(archive, dest),
            Some("gz") => self.extract_gzip(archive, dest),
            _ => self.copy_raw(archive, dest),
        }
    }

    fn extract_zip(&self, archive: &Path, dest: &Path) -> Result<(), ExtractionError> {
        let file = File::open(archive).map_err(|e| io_err(archive, e))?;
        let mut zip = zip::ZipArchive::new(file).map_err(|e| zip_err(archive, e))?;
        zip.extract(dest).map_err(|e| zip_err(archive, e))?;
        Ok(())
    }

    fn extract_gzip(&self, archive: &Path, dest: &Path) -> Result<(), ExtractionError> {
        let file = File::open(archive).map_err(|e| io_err(archive, e))?;
        let mut decoder = flate2::read::GzDecoder::new(file);

        // events.json.gz -> events.json
        let output_name = archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "extracted.json".to_owned());
        let output_path = dest.join(output_name);
        let mut output = File::create(&output_path).map_err(|e| io_err(&output_path, e))?;

        std::io::copy(&mut decoder, &mut output).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                ExtractionError::Corrupt {
                    path: archive.display().to_string(),
                    reason: e.to_string(),
                }
            } else {
                io_err(archive, e)
            }
        })?;
        Ok(())
    }

    fn copy_raw(&self, archive: &Path, dest: &Path) -> Result<(), ExtractionError> {
        let file_name = archive
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset.json".to_owned());
        fs::copy(archive, dest.join(file_name)).map_err(|e| io_err(archive, e))?;
        Ok(())
    }
}

fn io_err(path: &Path, source: std::io::Error) -> ExtractionError {
    ExtractionError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn zip_err(path: &Path, err: zip::result::ZipError) -> ExtractionError {
    match err {
        zip::result::ZipError::Io(e) => io_err(path, e),
        other => ExtractionError::Corrupt {
            path: path.display().to_string(),
            reason: other.to_string(),
        },
    }
}
