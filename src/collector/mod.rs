//! 링크 수집 모듈
//!
//! 루트 URL에서 추출할 페이지 URL 목록을 만듭니다.
//! - Sitemap: `<loc>` 값을 문서 순서대로
//! - Anchors: 시드 페이지의 링크 중 사이트별 규칙에 맞는 것만 절대 URL로
//! - SinglePage: 루트 URL 하나
//!
//! 결과는 항상 중복 제거됩니다 (처음 등장한 순서 유지).

mod sitemap;

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::error::CollectError;
use crate::scraper::PageFetcher;

pub use sitemap::parse_urlset;

// ============================================================================
// Strategy Types
// ============================================================================

/// 시드 페이지 링크 포함 규칙
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InclusionRule {
    /// href에 특정 문자열 포함 (예: "/docs/")
    PathContains(String),
    /// 공백으로 구분된 클래스를 모두 가진 링크 (예: "reference internal")
    HasClasses(String),
}

impl InclusionRule {
    fn matches(&self, href: &str, element: &scraper::node::Element) -> bool {
        match self {
            InclusionRule::PathContains(needle) => href.contains(needle.as_str()),
            InclusionRule::HasClasses(classes) => {
                let mut wanted = classes.split_whitespace().peekable();
                wanted.peek().is_some()
                    && wanted.all(|class| element.classes().any(|c| c == class))
            }
        }
    }
}

/// 링크 수집 전략
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStrategy {
    /// sitemap XML 파싱
    Sitemap { sitemap_url: String },
    /// 루트 페이지의 링크 추적
    Anchors(InclusionRule),
    /// 루트 페이지만
    SinglePage,
}

impl LinkStrategy {
    /// 로그용 짧은 이름
    pub fn label(&self) -> &'static str {
        match self {
            LinkStrategy::Sitemap { .. } => "sitemap",
            LinkStrategy::Anchors(_) => "anchors",
            LinkStrategy::SinglePage => "single-page",
        }
    }
}

// ============================================================================
// LinkCollector
// ============================================================================

/// 링크 수집기
pub struct LinkCollector<'a> {
    fetcher: &'a dyn PageFetcher,
}

impl<'a> LinkCollector<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher) -> Self {
        Self { fetcher }
    }

    /// 전략에 따라 페이지 URL 수집
    ///
    /// 가져오기/파싱 실패는 부분 결과 없이 그대로 반환합니다.
    pub async fn collect(
        &self,
        root_url: &str,
        strategy: &LinkStrategy,
    ) -> Result<Vec<String>, CollectError> {
        let root = Url::parse(root_url).map_err(|source| CollectError::InvalidUrl {
            url: root_url.to_string(),
            source,
        })?;

        let urls = match strategy {
            LinkStrategy::Sitemap { sitemap_url } => {
                tracing::info!("Fetching sitemap: {}", sitemap_url);
                let xml = self.fetcher.fetch(sitemap_url).await?;
                parse_urlset(&xml)?
            }
            LinkStrategy::Anchors(rule) => {
                tracing::info!("Following links from: {}", root_url);
                let html = self.fetcher.fetch(root_url).await?;
                anchor_links(&html, &root, rule)
            }
            LinkStrategy::SinglePage => vec![root_url.to_string()],
        };

        let urls = dedup_preserving_order(urls);
        tracing::info!(
            "Collected {} page urls ({}) from {}",
            urls.len(),
            strategy.label(),
            root_url
        );
        Ok(urls)
    }
}

/// 시드 페이지 HTML에서 규칙에 맞는 링크를 절대 URL로 변환 (프래그먼트 제거)
pub fn anchor_links(html: &str, base: &Url, rule: &InclusionRule) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            if !rule.matches(href, anchor.value()) {
                return None;
            }
            match base.join(href) {
                Ok(mut url) => {
                    url.set_fragment(None);
                    Some(url.to_string())
                }
                Err(e) => {
                    tracing::debug!("Skipping unresolvable href {}: {}", href, e);
                    None
                }
            }
        })
        .collect()
}

fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
