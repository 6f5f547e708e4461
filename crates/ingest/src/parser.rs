//! 스트리밍 이벤트 파서
//!
//! [`EventStream`]은 파일과 감지된 [`JsonFormat`]으로부터 (이벤트 | 에러)
//! 아이템의 유한한 단일 패스 시퀀스를 만들어냅니다. 재시작할 수 없으며,
//! 예산 기반 차단기(파일당 최대 라인 수, 최대 파싱 에러 수)를 내장합니다.
//!
//! # 형식별 전략
//! - `Ndjson`: 라인 단위 독립 파싱. 손상 라인은 에러 아이템으로 산출
//! - `JsonArray`: 배열을 요소 단위로 증분 디코딩하여 메모리 사용을 제한
//! - `Mixed`: 균일 파싱이 실패하는 것이 확정이므로 NDJSON 전략 재사용
//! - `Unknown`: NDJSON 전략으로 강등 (최선 노력, 치명적이지 않음)
//!
//! 빈 파일은 에러 없이 0개의 아이템을 냅니다.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use warden_core::types::JsonFormat;

use crate::config::IngestionConfig;

/// 파서 예산 — 스트림이 스스로를 중단시키는 조건
#[derive(Debug, Clone, Copy)]
pub struct ParserLimits {
    /// 파일당 산출할 최대 아이템 수 (이벤트와 에러 모두 포함)
    pub max_events_per_file: u64,
    /// 파일당 허용하는 최대 파싱 에러 수
    pub max_parse_errors: u64,
    /// 파싱 에러 후 계속 진행 여부
    pub continue_on_parse_errors: bool,
}

impl ParserLimits {
    /// 파이프라인 설정에서 예산을 구성합니다.
    pub fn from_config(config: &IngestionConfig) -> Self {
        Self {
            max_events_per_file: config.max_events_per_file,
            max_parse_errors: config.max_parse_errors_per_file,
            continue_on_parse_errors: config.continue_on_parse_errors,
        }
    }
}

/// 파싱 실패 아이템
#[derive(Debug, Clone)]
pub struct ParseFailure {
    /// 실패한 라인 번호 (라인 기반 전략일 때)
    pub line: Option<usize>,
    /// 실패 사유
    pub reason: String,
    /// 이 실패로 스트림이 종료되었는지 여부
    pub terminal: bool,
}

/// 스트림이 산출하는 아이템 — 파싱된 이벤트 또는 에러
#[derive(Debug, Clone)]
pub enum StreamItem {
    /// 파싱에 성공한 원본 이벤트
    Event(Value),
    /// 파싱 실패
    Error(ParseFailure),
}

enum StreamKind {
    /// 라인 단위 파싱 (NDJSON / Mixed / Unknown)
    Lines { reader: BufReader<File>, line_no: usize },
    /// 배열 요소 단위 증분 디코딩
    Array(ArrayReader),
}

/// 단일 패스 이벤트 스트림
///
/// `Iterator`를 구현하며, 소진된 뒤에는 항상 `None`을 반환합니다.
pub struct EventStream {
    kind: StreamKind,
    limits: ParserLimits,
    items_yielded: u64,
    parse_errors: u64,
    fused: bool,
}

impl EventStream {
    /// 파일을 열어 스트림을 구성합니다.
    ///
    /// 파일을 열지 못하는 경우만 에러를 반환하며, 내용이 손상된 경우는
    /// 스트림 아이템으로 보고됩니다.
    pub fn open(
        path: &Path,
        format: JsonFormat,
        limits: ParserLimits,
    ) -> std::io::Result<EventStream> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let kind = match format {
            JsonFormat::JsonArray => StreamKind::Array(ArrayReader::new(reader)),
            JsonFormat::Ndjson | JsonFormat::Mixed | JsonFormat::Unknown => {
                StreamKind::Lines { reader, line_no: 0 }
            }
        };
        Ok(EventStream {
            kind,
            limits,
            items_yielded: 0,
            parse_errors: 0,
            fused: false,
        })
    }

    /// 지금까지 발생한 파싱 에러 수를 반환합니다.
    pub fn parse_errors(&self) -> u64 {
        self.parse_errors
    }

    /// 지금까지 산출한 아이템 수를 반환합니다.
    pub fn items_yielded(&self) -> u64 {
        self.items_yielded
    }

    fn next_line_item(&mut self) -> Option<StreamItem> {
        let StreamKind::Lines { reader, line_no } = &mut self.kind else {
            return None;
        };

        let mut line = String::new();
        loop {
            line.clear();
            *line_no += 1;
            match reader.read_line(&mut line) {
                Ok(0) => {
                    self.fused = true;
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    // 읽기 실패 후의 스트림 위치는 신뢰할 수 없으므로 종료
                    self.fused = true;
                    self.parse_errors += 1;
                    self.items_yielded += 1;
                    return Some(StreamItem::Error(ParseFailure {
                        line: Some(*line_no),
                        reason: format!("unreadable line: {e}"),
                        terminal: true,
                    }));
                }
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                // 빈 라인은 예산을 소비하지 않음
                continue;
            }

            self.items_yielded += 1;
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => return Some(StreamItem::Event(value)),
                Err(e) => {
                    self.parse_errors += 1;
                    if self.parse_errors > self.limits.max_parse_errors {
                        self.fused = true;
                        return Some(StreamItem::Error(ParseFailure {
                            line: Some(*line_no),
                            reason: format!(
                                "parse error limit exceeded ({} errors)",
                                self.limits.max_parse_errors
                            ),
                            terminal: true,
                        }));
                    }
                    let terminal = !self.limits.continue_on_parse_errors;
                    if terminal {
                        self.fused = true;
                    }
                    return Some(StreamItem::Error(ParseFailure {
                        line: Some(*line_no),
                        reason: e.to_string(),
                        terminal,
                    }));
                }
            }
        }
    }

    fn next_array_item(&mut self) -> Option<StreamItem> {
        let StreamKind::Array(array) = &mut self.kind else {
            return None;
        };
        match array.next_element() {
            Some(Ok(value)) => {
                self.items_yielded += 1;
                Some(StreamItem::Event(value))
            }
            Some(Err(reason)) => {
                // 최상위 디코딩 실패는 단일 종단 에러
                self.fused = true;
                self.parse_errors += 1;
                self.items_yielded += 1;
                Some(StreamItem::Error(ParseFailure {
                    line: None,
                    reason,
                    terminal: true,
                }))
            }
            None => {
                self.fused = true;
                None
            }
        }
    }
}

impl Iterator for EventStream {
    type Item = StreamItem;

    fn next(&mut self) -> Option<StreamItem> {
        if self.fused {
            return None;
        }
        if self.items_yielded >= self.limits.max_events_per_file {
            self.fused = true;
            return None;
        }
        match self.kind {
            StreamKind::Lines { .. } => self.next_line_item(),
            StreamKind::Array(_) => self.next_array_item(),
        }
    }
}

// --- JSON 배열 증분 디코딩 ---

#[derive(Clone, Copy)]
enum ArrayState {
    /// 여는 대괄호를 아직 읽지 않음
    Start,
    /// 요소를 읽는 중
    Elements { first: bool },
    /// 닫는 대괄호까지 읽음
    Done,
}

/// `[` value (`,` value)* `]` 를 요소 단위로 읽어내는 리더
///
/// 요소 하나씩만 메모리에 올리므로 배열 크기와 무관하게 메모리가 제한됩니다.
struct ArrayReader {
    reader: BufReader<File>,
    state: ArrayState,
    index: usize,
}

impl ArrayReader {
    fn new(reader: BufReader<File>) -> Self {
        Self {
            reader,
            state: ArrayState::Start,
            index: 0,
        }
    }

    /// 공백을 건너뛰고 다음 바이트를 소비하지 않은 채 반환합니다.
    fn peek_non_ws(&mut self) -> std::io::Result<Option<u8>> {
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(None);
            }
            let mut consumed = 0;
            for &byte in buf {
                if byte == b' ' || byte == b'\t' || byte == b'\n' || byte == b'\r' {
                    consumed += 1;
                } else {
                    let next = byte;
                    self.reader.consume(consumed);
                    return Ok(Some(next));
                }
            }
            let len = buf.len();
            self.reader.consume(len);
        }
    }

    /// 바이트 하나를 소비합니다. `peek_non_ws` 직후에만 호출합니다.
    fn consume_byte(&mut self) {
        self.reader.consume(1);
    }

    /// 구분자(공백, `,`, `]`) 앞까지의 스칼라 토큰을 읽습니다.
    ///
    /// 숫자/불리언/null은 자기 종결 토큰이 아니어서 리더에서 직접 잘라낸 뒤
    /// 파싱해야 뒤따르는 구분자를 잃지 않습니다.
    fn read_scalar_token(&mut self) -> std::io::Result<Vec<u8>> {
        let mut token = Vec::new();
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(token);
            }
            let mut consumed = 0;
            for &byte in buf {
                if matches!(byte, b',' | b']' | b' ' | b'\t' | b'\n' | b'\r') {
                    self.reader.consume(consumed);
                    return Ok(token);
                }
                token.push(byte);
                consumed += 1;
            }
            self.reader.consume(consumed);
        }
    }

    /// 다음 배열 요소를 반환합니다.
    ///
    /// `Some(Err(_))`는 종단 디코딩 실패, `None`은 정상 소진입니다.
    fn next_element(&mut self) -> Option<Result<Value, String>> {
        loop {
            match self.state {
                ArrayState::Start => {
                    match self.peek_non_ws() {
                        Ok(Some(b'[')) => {
                            self.consume_byte();
                            self.state = ArrayState::Elements { first: true };
                        }
                        Ok(Some(byte)) => {
                            self.state = ArrayState::Done;
                            return Some(Err(format!(
                                "expected '[' at start of JSON array, found '{}'",
                                byte as char
                            )));
                        }
                        Ok(None) => {
                            self.state = ArrayState::Done;
                            return Some(Err("empty input, expected JSON array".to_owned()));
                        }
                        Err(e) => {
                            self.state = ArrayState::Done;
                            return Some(Err(format!("read error: {e}")));
                        }
                    }
                }
                ArrayState::Elements { first } => {
                    match self.peek_non_ws() {
                        Ok(Some(b']')) => {
                            self.consume_byte();
                            self.state = ArrayState::Done;
                            return None;
                        }
                        Ok(Some(byte)) => {
                            if !first {
                                if byte != b',' {
                                    self.state = ArrayState::Done;
                                    return Some(Err(format!(
                                        "expected ',' or ']' after array element {}, found '{}'",
                                        self.index,
                                        byte as char
                                    )));
                                }
                                self.consume_byte();
                            }
                            self.state = ArrayState::Elements { first: false };
                            return Some(self.read_element_value());
                        }
                        Ok(None) => {
                            self.state = ArrayState::Done;
                            return Some(Err(
                                "unexpected end of file inside JSON array".to_owned()
                            ));
                        }
                        Err(e) => {
                            self.state = ArrayState::Done;
                            return Some(Err(format!("read error: {e}")));
                        }
                    }
                }
                ArrayState::Done => return None,
            }
        }
    }

    fn read_element_value(&mut self) -> Result<Value, String> {
        let lead = match self.peek_non_ws() {
            Ok(Some(byte)) => byte,
            Ok(None) => {
                self.state = ArrayState::Done;
                return Err("unexpected end of file inside JSON array".to_owned());
            }
            Err(e) => {
                self.state = ArrayState::Done;
                return Err(format!("read error: {e}"));
            }
        };

        let result = if matches!(lead, b'{' | b'[' | b'"') {
            // 객체/배열/문자열은 자기 종결 토큰이라 스트리밍 디코더로 바로 읽음
            let mut de = serde_json::Deserializer::from_reader(self.reader.by_ref());
            Value::deserialize(&mut de)
                .map_err(|e| format!("array element {}: {}", self.index, e))
        } else {
            match self.read_scalar_token() {
                Ok(token) => serde_json::from_slice(&token)
                    .map_err(|e| format!("array element {}: {}", self.index, e)),
                Err(e) => Err(format!("read error: {e}")),
            }
        };

        match result {
            Ok(value) => {
                self.index += 1;
                Ok(value)
            }
            Err(reason) => {
                self.state = ArrayState::Done;
                Err(reason)
            }
        }
    }
}
