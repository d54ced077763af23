//! 에러 타입 모음
//!
//! 라이브러리 계층은 thiserror 기반의 구체 타입을 반환하고,
//! CLI 계층에서 anyhow로 감싸 컨텍스트를 붙입니다.

use std::path::PathBuf;

use thiserror::Error;

/// 단일 URL 가져오기 실패
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
}

/// 링크 수집 실패 (실행 전체가 중단됨)
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("invalid root url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("sitemap is not valid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("sitemap contains an invalid escape: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
}

/// 페이지 단위 추출 실패 (해당 페이지만 건너뜀)
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("main content container `{selector}` not found")]
    MissingMainContent { selector: String },

    #[error("code block without a nested `{tag}` element")]
    MissingCodeElement { tag: String },

    #[error("page produced no text")]
    EmptyContent,

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// 코퍼스 저장/로드 실패
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corpus JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// QA 백엔드 실패. 호출자에게는 항상 "답 없음"으로 노출됩니다.
#[derive(Debug, Error)]
pub enum QaError {
    #[error("QA backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("QA backend responded with HTTP {0}")]
    Status(u16),

    #[error("malformed structured answer: {0}")]
    MalformedAnswer(String),

    #[error("QA endpoint is not configured")]
    NotConfigured,
}

/// 시작 시 설정 검증 실패
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive number of seconds, got `{value}`")]
    InvalidTimeout { key: &'static str, value: String },

    #[error("{key} is not a valid URL (`{value}`): {source}")]
    InvalidUrl {
        key: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
}
