//! 사이트별 추출 전략
//!
//! 호스트 이름(정확히 일치)으로 추출기를 선택하고,
//! 알 수 없는 호스트는 전체 페이지 텍스트 추출로 폴백합니다.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use scraper::{Html, Selector};
use url::Url;

use crate::collector::{InclusionRule, LinkStrategy};
use crate::error::ExtractError;

use super::walker::{parse_selector, visible_text, walk_document, CodeBlockRule, ContentRules};

/// 제목이 없을 때 사용하는 값
pub const NO_TITLE: &str = "No title available";

// ============================================================================
// Types
// ============================================================================

/// 한 페이지의 추출 결과 (id, URL은 코퍼스 빌더가 붙임)
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    pub title: String,
    pub text: String,
    pub source_links: Vec<String>,
    /// 사이트별 부가 정보 (Substack 저자 등)
    pub metadata: BTreeMap<String, String>,
}

/// 사이트별 추출기 트레이트
pub trait SiteExtractor: Send + Sync {
    /// 추출기 이름
    fn name(&self) -> &'static str;

    /// 루트 URL에서 수집할 링크를 찾는 기본 전략
    fn default_links(&self, root_url: &Url) -> LinkStrategy;

    /// 파싱된 페이지에서 본문 추출
    fn extract(&self, document: &Html, page_url: &str) -> Result<ExtractedPage, ExtractError>;
}

/// `<title>` 텍스트, 없거나 비어 있으면 [`NO_TITLE`]
pub fn page_title(document: &Html) -> String {
    Selector::parse("title")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| element.text().collect::<String>().trim().to_string())
        })
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string())
}

// ============================================================================
// Structured docs sites (ReadMe, ReadTheDocs, Mintlify)
// ============================================================================

#[derive(Debug, Clone)]
enum DefaultLinks {
    Follow(InclusionRule),
    Sitemap,
}

/// 본문 컨테이너 + 노드 규칙 기반 추출기
pub struct StructuredExtractor {
    name: &'static str,
    rules: ContentRules,
    links: DefaultLinks,
}

impl StructuredExtractor {
    /// ReadMe 문서 사이트: `main.layout__main`, `/docs/` 링크 추적
    pub fn readme() -> Result<Self, ExtractError> {
        Ok(Self {
            name: "readme",
            rules: ContentRules::new("main.layout__main")?,
            links: DefaultLinks::Follow(InclusionRule::PathContains("/docs/".to_string())),
        })
    }

    /// ReadTheDocs (Sphinx): `[role=main]`, 내부 참조 링크 추적
    pub fn readthedocs() -> Result<Self, ExtractError> {
        Ok(Self {
            name: "readthedocs",
            rules: ContentRules::new("[role=main]")?
                .with_code_blocks(CodeBlockRule::new("div", "highlight", "pre")?),
            links: DefaultLinks::Follow(InclusionRule::HasClasses(
                "reference internal".to_string(),
            )),
        })
    }

    /// Mintlify 계열 (Tailwind 레이아웃): sitemap 기반
    pub fn mintlify() -> Result<Self, ExtractError> {
        Ok(Self {
            name: "mintlify",
            rules: ContentRules::new("div.flex.flex-row.pt-9.gap-12.items-stretch")?
                .with_code_blocks(CodeBlockRule::new("div", "gray-frame", "code")?),
            links: DefaultLinks::Sitemap,
        })
    }
}

impl SiteExtractor for StructuredExtractor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn default_links(&self, root_url: &Url) -> LinkStrategy {
        match &self.links {
            DefaultLinks::Follow(rule) => LinkStrategy::Anchors(rule.clone()),
            DefaultLinks::Sitemap => {
                let sitemap_url = root_url
                    .join("/sitemap.xml")
                    .map(String::from)
                    .unwrap_or_else(|_| {
                        format!("{}/sitemap.xml", root_url.as_str().trim_end_matches('/'))
                    });
                LinkStrategy::Sitemap { sitemap_url }
            }
        }
    }

    fn extract(&self, document: &Html, page_url: &str) -> Result<ExtractedPage, ExtractError> {
        let title = page_title(document);
        let walked = walk_document(document, &self.rules, page_url)?;

        if walked.text.trim().is_empty() {
            return Err(ExtractError::EmptyContent);
        }

        Ok(ExtractedPage {
            title,
            text: walked.text,
            source_links: walked.source_links,
            metadata: BTreeMap::new(),
        })
    }
}

// ============================================================================
// Substack
// ============================================================================

/// Substack 게시글 추출기 (단일 페이지 + 메타데이터)
pub struct SubstackExtractor {
    rules: ContentRules,
    fields: Vec<(&'static str, Selector)>,
}

impl SubstackExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            rules: ContentRules::new("div.available-content")?,
            fields: vec![
                ("Title of this Substack post", parse_selector("h1.post-title")?),
                ("Subtitle", parse_selector("h3.subtitle")?),
                ("Author", parse_selector("span.byline-names")?),
            ],
        })
    }
}

impl SiteExtractor for SubstackExtractor {
    fn name(&self) -> &'static str {
        "substack"
    }

    fn default_links(&self, _root_url: &Url) -> LinkStrategy {
        LinkStrategy::SinglePage
    }

    fn extract(&self, document: &Html, page_url: &str) -> Result<ExtractedPage, ExtractError> {
        let walked = walk_document(document, &self.rules, page_url)?;
        if walked.text.trim().is_empty() {
            return Err(ExtractError::EmptyContent);
        }

        // 메타데이터는 있는 항목만 기록
        let metadata = self
            .fields
            .iter()
            .filter_map(|(key, selector)| {
                let value = document
                    .select(selector)
                    .next()?
                    .text()
                    .collect::<String>()
                    .trim()
                    .to_string();
                (!value.is_empty()).then(|| (key.to_string(), value))
            })
            .collect();

        Ok(ExtractedPage {
            title: page_title(document),
            text: walked.text,
            source_links: walked.source_links,
            metadata,
        })
    }
}

// ============================================================================
// Plain text fallback
// ============================================================================

/// 알 수 없는 호스트용: 페이지 전체 텍스트 (구조/링크 없음)
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl SiteExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    fn default_links(&self, _root_url: &Url) -> LinkStrategy {
        LinkStrategy::SinglePage
    }

    fn extract(&self, document: &Html, _page_url: &str) -> Result<ExtractedPage, ExtractError> {
        let mut pieces = Vec::new();
        visible_text(document.root_element(), &mut pieces);

        // 연속 공백 정리
        let text = pieces
            .iter()
            .flat_map(|piece| piece.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return Err(ExtractError::EmptyContent);
        }

        Ok(ExtractedPage {
            title: page_title(document),
            text,
            source_links: Vec::new(),
            metadata: BTreeMap::new(),
        })
    }
}

// ============================================================================
// Registry
// ============================================================================

/// 호스트 이름 → 추출기 매핑
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn SiteExtractor>>,
    fallback: Arc<dyn SiteExtractor>,
}

impl ExtractorRegistry {
    /// 빈 레지스트리 (모든 호스트가 폴백 사용)
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
            fallback: Arc::new(PlainTextExtractor::new()),
        }
    }

    /// 기본 사이트 매핑
    pub fn with_defaults() -> Result<Self, ExtractError> {
        let mintlify: Arc<dyn SiteExtractor> = Arc::new(StructuredExtractor::mintlify()?);

        let mut registry = Self::empty();
        registry.register("readme.com", Arc::new(StructuredExtractor::readme()?));
        registry.register("readthedocs.io", Arc::new(StructuredExtractor::readthedocs()?));
        registry.register("substack.com", Arc::new(SubstackExtractor::new()?));
        registry.register("mintlify.com", Arc::clone(&mintlify));
        registry.register("docs.mindsdb.com", mintlify);
        Ok(registry)
    }

    /// 호스트에 추출기 등록 (기존 매핑 교체)
    pub fn register(&mut self, hostname: impl Into<String>, extractor: Arc<dyn SiteExtractor>) {
        self.extractors.insert(hostname.into(), extractor);
    }

    /// 호스트에 맞는 추출기, 없으면 폴백
    pub fn resolve(&self, hostname: &str) -> Arc<dyn SiteExtractor> {
        self.extractors
            .get(hostname)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    /// 등록된 호스트 목록 (정렬됨)
    pub fn hostnames(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ExtractorRegistry {
        ExtractorRegistry::with_defaults().expect("default registry")
    }

    #[test]
    fn test_page_title() {
        let doc = Html::parse_document("<html><head><title> Intro </title></head></html>");
        assert_eq!(page_title(&doc), "Intro");

        let doc = Html::parse_document("<html><body><h1>Heading only</h1></body></html>");
        assert_eq!(page_title(&doc), NO_TITLE);

        let doc = Html::parse_document("<html><head><title>   </title></head></html>");
        assert_eq!(page_title(&doc), NO_TITLE);
    }

    #[test]
    fn test_registry_resolution() {
        let registry = registry();
        assert_eq!(registry.resolve("readme.com").name(), "readme");
        assert_eq!(registry.resolve("readthedocs.io").name(), "readthedocs");
        assert_eq!(registry.resolve("substack.com").name(), "substack");
        assert_eq!(registry.resolve("docs.mindsdb.com").name(), "mintlify");
        // 정확히 일치하는 호스트만
        assert_eq!(registry.resolve("foo.readthedocs.io").name(), "plain-text");
        assert_eq!(registry.resolve("example.org").name(), "plain-text");
    }

    #[test]
    fn test_registry_register_overrides() {
        let mut registry = registry();
        registry.register("example.org", Arc::new(StructuredExtractor::readme().expect("readme")));
        assert_eq!(registry.resolve("example.org").name(), "readme");
        assert!(registry.hostnames().contains(&"example.org"));
    }

    #[test]
    fn test_default_link_strategies() {
        let root = Url::parse("https://docs.mindsdb.com/what-is-mindsdb").expect("url");
        let registry = registry();

        assert_eq!(
            registry.resolve("docs.mindsdb.com").default_links(&root),
            LinkStrategy::Sitemap {
                sitemap_url: "https://docs.mindsdb.com/sitemap.xml".to_string()
            }
        );
        assert_eq!(
            registry.resolve("readme.com").default_links(&root),
            LinkStrategy::Anchors(InclusionRule::PathContains("/docs/".to_string()))
        );
        assert_eq!(
            registry.resolve("example.org").default_links(&root),
            LinkStrategy::SinglePage
        );
    }

    #[test]
    fn test_readme_extract() {
        let html = r#"
            <html>
                <head><title>Payments</title></head>
                <body>
                    <nav><a href="/docs/other">Nav link</a></nav>
                    <main class="layout__main">
                        <h1>Accept payments</h1>
                        <p>See <a href="/docs/api">the API</a> and <a href="https://stripe.com">Stripe</a>.</p>
                    </main>
                </body>
            </html>
        "#;
        let doc = Html::parse_document(html);
        let page = StructuredExtractor::readme()
            .expect("readme")
            .extract(&doc, "https://paystack.com/docs/payments")
            .expect("extract");

        assert_eq!(page.title, "Payments");
        assert_eq!(
            page.text,
            "Accept payments See the API (Reference url: https://paystack.com/docs/payments/docs/api) and Stripe . "
        );
        assert_eq!(page.source_links, vec!["/docs/api".to_string()]);
        assert!(!page.text.contains("Nav link"));
    }

    #[test]
    fn test_mintlify_extract_with_code() {
        let html = r#"
            <html><head><title>Quickstart</title></head><body>
            <div class="flex flex-row pt-9 gap-12 items-stretch">
                <p>Install it:</p>
                <div class="gray-frame"><pre><code>pip install mindsdb</code></pre></div>
            </div>
            </body></html>
        "#;
        let doc = Html::parse_document(html);
        let page = StructuredExtractor::mintlify()
            .expect("mintlify")
            .extract(&doc, "https://docs.mindsdb.com/quickstart")
            .expect("extract");

        assert!(page.text.starts_with("Install it: "));
        assert!(page.text.contains("```\npip install mindsdb\n```"));
    }

    #[test]
    fn test_readthedocs_extract() {
        let html = r#"
            <html><head><title>Usage</title></head><body>
            <div role="main">
                <p>Call <a class="reference internal" href="api.html#index">the index</a>.</p>
                <div class="highlight"><pre>index.query("hi")</pre></div>
            </div>
            </body></html>
        "#;
        let doc = Html::parse_document(html);
        let page = StructuredExtractor::readthedocs()
            .expect("rtd")
            .extract(&doc, "https://gpt-index.readthedocs.io/en/latest/usage.html")
            .expect("extract");

        assert_eq!(page.source_links, vec!["api.html#index".to_string()]);
        assert!(page.text.contains("```\nindex.query(\"hi\")\n```"));
    }

    #[test]
    fn test_empty_container_skipped() {
        let doc = Html::parse_document(r#"<main class="layout__main">   </main>"#);
        let result = StructuredExtractor::readme()
            .expect("readme")
            .extract(&doc, "https://x.com/docs");
        assert!(matches!(result, Err(ExtractError::EmptyContent)));
    }

    #[test]
    fn test_substack_metadata() {
        let html = r#"
            <html><head><title>Post</title></head><body>
            <h1 class="post-title">Weekly notes</h1>
            <span class="byline-names">Ada</span>
            <div class="available-content"><p>Hello readers</p></div>
            </body></html>
        "#;
        let doc = Html::parse_document(html);
        let page = SubstackExtractor::new()
            .expect("substack")
            .extract(&doc, "https://ada.substack.com/p/weekly")
            .expect("extract");

        assert_eq!(page.text, "Hello readers ");
        assert_eq!(
            page.metadata.get("Title of this Substack post").map(String::as_str),
            Some("Weekly notes")
        );
        assert_eq!(page.metadata.get("Author").map(String::as_str), Some("Ada"));
        assert!(!page.metadata.contains_key("Subtitle"));
    }

    #[test]
    fn test_plain_text_fallback() {
        let html = "<html><head><title>T</title></head><body><p>Hello   <a href=\"/x\">world</a></p>\n<p>again</p></body></html>";
        let doc = Html::parse_document(html);
        let page = PlainTextExtractor::new()
            .extract(&doc, "https://example.org")
            .expect("extract");

        assert_eq!(page.text, "T Hello world again");
        assert!(page.source_links.is_empty());
    }

    #[test]
    fn test_plain_text_skips_scripts_and_styles() {
        let html = "<html><head><title>T</title><script>var secret = 1;</script>\
            <style>p{color:red}</style></head>\
            <body><p>Hello</p><noscript>enable js</noscript></body></html>";
        let doc = Html::parse_document(html);
        let page = PlainTextExtractor::new()
            .extract(&doc, "https://example.org")
            .expect("extract");

        assert_eq!(page.text, "T Hello");
    }

    #[test]
    fn test_plain_text_empty_page() {
        let doc = Html::parse_document("<html><body>  </body></html>");
        let result = PlainTextExtractor::new().extract(&doc, "https://example.org");
        assert!(matches!(result, Err(ExtractError::EmptyContent)));
    }
}
