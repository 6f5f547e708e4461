//! 파이프라인 오케스트레이션 — 추출/감지/파싱/검증/변환의 전체 흐름
//!
//! [`IngestPipeline`]은 데이터셋 아카이브 하나를 받아 추출하고, 발견된
//! `*.json` 파일을 순차 처리하여 데이터셋 집계를 반환합니다.
//!
//! # 내부 흐름
//! ```text
//! Extractor -> *.json 탐색 -> (FormatDetector -> EventStream
//!     -> EventValidator -> EventTransformer) per file -> DatasetMetrics
//! ```
//!
//! 이벤트/파일 단위 에러는 절대 밖으로 전파되지 않으며, 추출 실패만이
//! 데이터셋 전체를 중단시킵니다. 임시 디렉토리는 [`ScratchDir`] 드롭으로
//! 모든 종료 경로에서 제거됩니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

use warden_core::pipeline::MetricsSink;
use warden_core::types::{DatasetMetrics, FileResult, JsonFormat, ProcessingStatus};

use crate::config::IngestionConfig;
use crate::detector::FormatDetector;
use crate::error::IngestError;
use crate::extract::Extractor;
use crate::metrics::{
    sink_for, InFlightGuard, STATUS_PARSE_ERROR, STATUS_PROCESSED, STATUS_VALIDATION_ERROR,
};
use crate::parser::{EventStream, ParserLimits, StreamItem};
use crate::transform::EventTransformer;
use crate::validator::EventValidator;

/// 데이터셋 수집 파이프라인
///
/// 인스턴스당 한 번 구성된 불변 설정으로 동작하며,
/// [`IngestPipelineBuilder`]로 생성합니다.
///
/// # 사용 예시
/// ```ignore
/// use warden_ingest::{IngestPipelineBuilder, IngestionConfig};
///
/// let pipeline = IngestPipelineBuilder::new()
///     .config(IngestionConfig::default())
///     .build()?;
/// let metrics = pipeline.process_dataset("/data/tenant-a/auth.zip".as_ref(), "tenant-a")?;
/// println!("{metrics}");
/// ```
pub struct IngestPipeline {
    /// 파이프라인 설정
    config: IngestionConfig,
    /// 포맷 감지기
    detector: FormatDetector,
    /// 이벤트 검증기
    validator: EventValidator,
    /// 이벤트 변환기
    transformer: EventTransformer,
    /// 아카이브 추출기
    extractor: Extractor,
    /// 메트릭 수집 인터페이스
    metrics: Arc<dyn MetricsSink>,
}

impl IngestPipeline {
    /// 현재 설정에 대한 참조를 반환합니다.
    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// 파일 하나를 처리하고 결과를 반환합니다.
    ///
    /// 크기 상한을 넘는 파일은 파싱 시도 없이 `Skipped`로 보고됩니다.
    /// 그 외에는 포맷 감지 → 스트리밍 파싱 → 검증 → 변환을 수행하며,
    /// 개별 이벤트의 실패는 카운터로만 기록됩니다.
    pub fn process_file(&self, path: &Path, dataset: &str, tenant: &str) -> FileResult {
        self.process_file_bounded(path, dataset, tenant, self.config.max_events_per_file)
    }

    /// `max_items`로 스트림 예산을 추가 제한하는 내부 구현.
    ///
    /// 데이터셋 루프가 남은 이벤트 예산을 파일 예산에 덧씌울 때 사용합니다.
    fn process_file_bounded(
        &self,
        path: &Path,
        dataset: &str,
        tenant: &str,
        max_items: u64,
    ) -> FileResult {
        let started = Instant::now();
        let _guard = InFlightGuard::new(Arc::clone(&self.metrics));
        let mut result = FileResult::new(path);

        // 크기 게이트 — 파싱 시도 전에 검사
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > self.config.max_file_size_bytes() => {
                info!(
                    file = %path.display(),
                    size_bytes = meta.len(),
                    limit_mb = self.config.max_file_size_mb,
                    "file exceeds size limit, skipping"
                );
                result.status = ProcessingStatus::Skipped;
                result.error_message = Some(format!(
                    "file size {} bytes exceeds {} MB limit",
                    meta.len(),
                    self.config.max_file_size_mb
                ));
                return self.finish_file(result, dataset, started);
            }
            Ok(_) => {}
            Err(e) => {
                result.error_message = Some(format!("cannot stat file: {e}"));
                result.resolve_status();
                return self.finish_file(result, dataset, started);
            }
        }

        let format = if self.config.enable_format_detection {
            let (format, metadata) = self.detector.detect(path);
            debug!(
                file = %path.display(),
                %format,
                sampled_lines = metadata.sampled_lines,
                valid_json_lines = metadata.valid_json_lines,
                "format detected"
            );
            format
        } else {
            JsonFormat::Ndjson
        };
        result.detected_format = format;

        let mut limits = ParserLimits::from_config(&self.config);
        limits.max_events_per_file = limits.max_events_per_file.min(max_items);
        let stream = match EventStream::open(path, format, limits) {
            Ok(stream) => stream,
            Err(e) => {
                result.error_message = Some(format!("cannot open file: {e}"));
                result.resolve_status();
                return self.finish_file(result, dataset, started);
            }
        };

        let file_label = path.display().to_string();
        let mut last_error: Option<String> = None;

        for item in stream {
            match item {
                StreamItem::Error(failure) => {
                    result.parse_errors += 1;
                    result.events_failed += 1;
                    result.push_error_detail(failure.reason.clone());
                    let error_type = if failure.line.is_none() {
                        "array_decode"
                    } else if failure.terminal {
                        "terminal"
                    } else {
                        "malformed_line"
                    };
                    self.metrics.parse_error(dataset, &file_label, error_type);
                    self.metrics.event(dataset, tenant, STATUS_PARSE_ERROR);
                    last_error = Some(failure.reason);
                }
                StreamItem::Event(event) => {
                    let validation = self.validator.validate(&event);
                    if !validation.is_valid {
                        result.validation_errors += 1;
                        result.events_failed += 1;
                        for error in &validation.errors {
                            result.push_error_detail(error.clone());
                        }
                        last_error = validation.errors.first().cloned();
                        self.metrics.event(dataset, tenant, STATUS_VALIDATION_ERROR);
                        continue;
                    }

                    let flat = self.transformer.transform(&event, tenant, dataset);
                    trace!(event_id = %flat.event_id, "event transformed");
                    result.events_processed += 1;
                    self.metrics.event(dataset, tenant, STATUS_PROCESSED);

                    if result.events_processed % self.config.batch_size as u64 == 0 {
                        debug!(
                            file = %path.display(),
                            processed = result.events_processed,
                            "ingestion progress"
                        );
                    }
                }
            }
        }

        result.resolve_status();
        if result.status == ProcessingStatus::Failed && result.error_message.is_none() {
            result.error_message =
                Some(last_error.unwrap_or_else(|| "no events parsed from file".to_owned()));
        }
        self.finish_file(result, dataset, started)
    }

    /// 파일 결과를 확정하고 메트릭을 기록합니다.
    fn finish_file(&self, mut result: FileResult, dataset: &str, started: Instant) -> FileResult {
        result.duration_secs = started.elapsed().as_secs_f64();
        self.metrics
            .file(dataset, result.detected_format, result.status);
        self.metrics
            .duration(dataset, "process_file", result.duration_secs);
        debug!(result = %result, "file processed");
        result
    }

    /// 데이터셋 아카이브 하나를 처리하고 집계를 반환합니다.
    ///
    /// 추출 실패(재시도 소진 포함)만이 에러로 전파되며, 그 외의 모든
    /// 입력 손상은 집계 카운터로 요약됩니다. 임시 디렉토리는 반환 경로와
    /// 무관하게 제거됩니다.
    pub fn process_dataset(
        &self,
        archive: &Path,
        tenant: &str,
    ) -> Result<DatasetMetrics, IngestError> {
        let started = Instant::now();
        let dataset = archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_owned());

        info!(
            archive = %archive.display(),
            tenant,
            dataset = dataset.as_str(),
            "processing dataset"
        );

        let mut metrics_out = DatasetMetrics::default();

        let scratch = match self.extractor.extract(archive) {
            Ok(scratch) => scratch,
            Err(e) => {
                warn!(
                    archive = %archive.display(),
                    error = %e,
                    "dataset aborted by extraction failure"
                );
                self.metrics.dataset(&dataset, tenant, false);
                self.metrics
                    .duration(&dataset, "process_dataset", started.elapsed().as_secs_f64());
                return Err(IngestError::Extraction(e));
            }
        };

        let files = discover_json_files(scratch.path());
        debug!(count = files.len(), "discovered dataset files");

        for file in &files {
            let remaining = self
                .config
                .max_events_per_dataset
                .saturating_sub(metrics_out.events_processed);
            if remaining == 0 {
                info!(
                    limit = self.config.max_events_per_dataset,
                    "dataset event budget reached, stopping early"
                );
                break;
            }
            let result = self.process_file_bounded(file, &dataset, tenant, remaining);
            metrics_out.fold(&result);
        }

        metrics_out.datasets_processed = 1;
        metrics_out.processing_time_seconds = started.elapsed().as_secs_f64();
        self.metrics.dataset(&dataset, tenant, true);
        self.metrics
            .duration(&dataset, "process_dataset", metrics_out.processing_time_seconds);
        info!(summary = %metrics_out, "dataset processed");
        Ok(metrics_out)
        // scratch 드롭 → 임시 디렉토리 제거
    }
}

/// 추출 디렉토리에서 `*.json` 파일을 재귀적으로 수집합니다.
///
/// 처리 순서를 결정적으로 만들기 위해 경로 기준으로 정렬합니다.
fn discover_json_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// 수집 파이프라인 빌더
pub struct IngestPipelineBuilder {
    config: IngestionConfig,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl IngestPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: IngestionConfig::default(),
            metrics: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: IngestionConfig) -> Self {
        self.config = config;
        self
    }

    /// 메트릭 구현을 주입합니다.
    ///
    /// 지정하지 않으면 `enable_metrics` 설정에 따라 기본 구현이 선택됩니다.
    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// 설정을 검증하고 파이프라인을 빌드합니다.
    pub fn build(self) -> Result<IngestPipeline, IngestError> {
        self.config.validate()?;

        let metrics = self
            .metrics
            .unwrap_or_else(|| sink_for(&self.config));

        Ok(IngestPipeline {
            detector: FormatDetector::new(self.config.format_detection_lines),
            validator: EventValidator::from_config(&self.config),
            transformer: EventTransformer::new(),
            extractor: Extractor::from_config(&self.config),
            metrics,
            config: self.config,
        })
    }
}

impl Default for IngestPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
