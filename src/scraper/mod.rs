//! 웹 스크래퍼 모듈 - 페이지 가져오기 + 사이트별 본문 추출
//!
//! - `PageFetcher`: URL → HTML 문자열 (테스트에서는 메모리 구현으로 대체)
//! - `walker`: 본문 컨테이너 DOM 순회 규칙
//! - `sites`: 호스트별 추출 전략과 레지스트리

mod sites;
mod walker;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::AppConfig;
use crate::error::FetchError;

pub use sites::{
    page_title, ExtractedPage, ExtractorRegistry, PlainTextExtractor, SiteExtractor,
    StructuredExtractor, SubstackExtractor, NO_TITLE,
};
pub use walker::{
    classify_href, parse_selector, walk_document, CodeBlockRule, ContentRules, LinkKind,
    WalkOutput,
};

// ============================================================================
// PageFetcher Trait
// ============================================================================

/// 페이지 본문을 가져오는 인터페이스
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// URL의 응답 본문 (HTML 또는 XML)
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

// ============================================================================
// WebScraper
// ============================================================================

/// reqwest 기반 HTTP 페처
pub struct WebScraper {
    client: reqwest::Client,
}

impl WebScraper {
    /// 새 스크래퍼 생성
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("HTTP 클라이언트 생성 실패")?;

        Ok(Self { client })
    }

    /// 설정값으로 생성
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.user_agent, config.http_timeout)
    }
}

#[async_trait]
impl PageFetcher for WebScraper {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!("Fetching: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
