//! JSON 레이아웃 감지기
//!
//! 파일 앞부분에서 제한된 수의 라인을 샘플링하여 [`JsonFormat`]을 판정합니다.
//!
//! # 판정 규칙
//! 1. 샘플 라인 전체를 이어붙인 문자열이 단일 JSON 배열로 파싱되면 `JsonArray`
//! 2. 비어 있지 않은 샘플 라인이 전부 독립적인 JSON 값이면 `Ndjson`
//! 3. 일부만 파싱되면 `Mixed`
//! 4. 하나도 파싱되지 않으면 (빈 파일 포함) `Unknown`
//!
//! I/O 에러는 메타데이터에 기록되고 `Unknown`으로 보고됩니다.
//! 이 함수는 호출자에게 절대 실패를 전파하지 않습니다.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;

use warden_core::types::JsonFormat;

/// 배열 샘플로 보관하는 최대 요소 수
const ARRAY_SAMPLE_SIZE: usize = 3;

/// 포맷 감지 과정에서 수집된 부가 정보
#[derive(Debug, Clone, Default)]
pub struct DetectionMetadata {
    /// 샘플링한 라인 수 (빈 라인 포함)
    pub sampled_lines: usize,
    /// 독립적인 JSON 값으로 파싱된 라인 수
    pub valid_json_lines: usize,
    /// 배열 형식일 때 앞쪽 요소 샘플 (최대 3개)
    pub sample: Vec<Value>,
    /// 감지 중 발생한 I/O 에러 (있을 경우)
    pub io_error: Option<String>,
}

/// 샘플 기반 JSON 레이아웃 감지기
///
/// 같은 파일에 대해 파일이 변경되지 않는 한 항상 같은 판정을 내립니다.
#[derive(Debug, Clone)]
pub struct FormatDetector {
    /// 샘플링할 최대 라인 수
    max_lines: usize,
}

impl FormatDetector {
    /// 새 감지기를 생성합니다.
    pub fn new(max_lines: usize) -> Self {
        Self { max_lines }
    }

    /// 파일의 JSON 레이아웃을 판정합니다.
    pub fn detect(&self, path: &Path) -> (JsonFormat, DetectionMetadata) {
        let mut metadata = DetectionMetadata::default();

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                metadata.io_error = Some(e.to_string());
                return (JsonFormat::Unknown, metadata);
            }
        };

        let reader = BufReader::new(file);
        let mut lines = Vec::with_capacity(self.max_lines.min(64));
        for line in reader.lines().take(self.max_lines) {
            match line {
                Ok(l) => lines.push(l),
                Err(e) => {
                    metadata.io_error = Some(e.to_string());
                    metadata.sampled_lines = lines.len();
                    return (JsonFormat::Unknown, metadata);
                }
            }
        }
        metadata.sampled_lines = lines.len();

        let non_blank: Vec<&str> = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        metadata.valid_json_lines = non_blank
            .iter()
            .filter(|l| serde_json::from_str::<Value>(l).is_ok())
            .count();

        // 샘플 전체가 단일 JSON 값인지 먼저 확인합니다.
        let joined = lines.join("\n");
        if let Ok(Value::Array(elements)) = serde_json::from_str::<Value>(&joined) {
            metadata.sample = elements.into_iter().take(ARRAY_SAMPLE_SIZE).collect();
            return (JsonFormat::JsonArray, metadata);
        }

        if non_blank.is_empty() {
            return (JsonFormat::Unknown, metadata);
        }

        let format = if metadata.valid_json_lines == non_blank.len() {
            JsonFormat::Ndjson
        } else if metadata.valid_json_lines > 0 {
            JsonFormat::Mixed
        } else {
            JsonFormat::Unknown
        };
        (format, metadata)
    }
}
