//! 크롤러 - 링크 수집 → 페이지 추출 → 코퍼스 빌드
//!
//! 페이지는 목록 순서대로 하나씩 처리합니다 (병렬 처리/재시도 없음).
//! 링크 수집 실패만 실행 전체를 중단시키고, 페이지 단위 실패는
//! 로그를 남기고 건너뜁니다.

use chrono::{DateTime, Utc};
use scraper::Html;
use url::Url;

use crate::collector::{LinkCollector, LinkStrategy};
use crate::corpus::{Corpus, CorpusBuilder};
use crate::error::{CollectError, ExtractError};
use crate::scraper::{ExtractedPage, ExtractorRegistry, PageFetcher, SiteExtractor};

// ============================================================================
// Types
// ============================================================================

/// 크롤링 요청
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// 루트 URL
    pub root_url: String,
    /// 호스트 이름 강제 지정 (커스텀 도메인의 문서 사이트 등)
    pub hostname_override: Option<String>,
    /// 링크 수집 전략 (없으면 추출기 기본값)
    pub strategy: Option<LinkStrategy>,
    /// 시도할 최대 페이지 수
    pub max_pages: Option<usize>,
}

impl CrawlRequest {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            hostname_override: None,
            strategy: None,
            max_pages: None,
        }
    }
}

/// 건너뛴 페이지
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPage {
    pub url: String,
    pub reason: String,
}

/// 크롤링 결과
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub corpus: Corpus,
    /// 사용된 추출기 이름
    pub extractor: &'static str,
    /// 시도한 페이지 수
    pub attempted: usize,
    pub skipped: Vec<SkippedPage>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn succeeded(&self) -> usize {
        self.corpus.len()
    }
}

// ============================================================================
// Crawler
// ============================================================================

/// 문서 사이트 크롤러
pub struct Crawler<F: PageFetcher> {
    fetcher: F,
    registry: ExtractorRegistry,
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(fetcher: F, registry: ExtractorRegistry) -> Self {
        Self { fetcher, registry }
    }

    /// 크롤링 실행
    pub async fn crawl(&self, request: &CrawlRequest) -> Result<CrawlReport, CollectError> {
        let started_at = Utc::now();

        let root = Url::parse(&request.root_url).map_err(|source| CollectError::InvalidUrl {
            url: request.root_url.clone(),
            source,
        })?;

        let hostname = request
            .hostname_override
            .clone()
            .or_else(|| root.host_str().map(str::to_string))
            .unwrap_or_default();
        let extractor = self.registry.resolve(&hostname);

        let strategy = request
            .strategy
            .clone()
            .unwrap_or_else(|| extractor.default_links(&root));

        tracing::info!(
            "Crawling {} (host: {}, extractor: {}, links: {})",
            request.root_url,
            hostname,
            extractor.name(),
            strategy.label()
        );

        let mut urls = LinkCollector::new(&self.fetcher)
            .collect(&request.root_url, &strategy)
            .await?;
        if let Some(max) = request.max_pages {
            urls.truncate(max);
        }

        let mut builder = CorpusBuilder::new();
        let mut skipped = Vec::new();

        for url in &urls {
            match self.process_page(extractor.as_ref(), url).await {
                Ok(page) => {
                    let id = builder.push(url, page);
                    tracing::debug!("Extracted #{}: {}", id, url);
                }
                Err(reason) => {
                    tracing::warn!("Could not extract text from {}: {}", url, reason);
                    skipped.push(SkippedPage {
                        url: url.clone(),
                        reason,
                    });
                }
            }
        }

        let corpus = builder.build();
        tracing::info!(
            "Crawl finished: {} extracted, {} skipped",
            corpus.len(),
            skipped.len()
        );

        Ok(CrawlReport {
            corpus,
            extractor: extractor.name(),
            attempted: urls.len(),
            skipped,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn process_page(
        &self,
        extractor: &dyn SiteExtractor,
        url: &str,
    ) -> Result<ExtractedPage, String> {
        let html = self.fetcher.fetch(url).await.map_err(|e| e.to_string())?;
        extract_html(extractor, &html, url).map_err(|e| e.to_string())
    }
}

/// HTML 파싱 + 추출 (파싱된 DOM은 이 호출 안에서만 유지)
pub fn extract_html(
    extractor: &dyn SiteExtractor,
    html: &str,
    page_url: &str,
) -> Result<ExtractedPage, ExtractError> {
    let document = Html::parse_document(html);
    extractor.extract(&document, page_url)
}

// ============================================================================
// Tests
// ============================================================================
