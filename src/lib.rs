//! docs-qa - 문서 사이트 크롤링 + 질의응답 코퍼스
//!
//! 문서 사이트를 sitemap 또는 링크 추적으로 크롤링하고, 사이트별 규칙으로
//! 본문과 참조 링크를 추출해 JSON 코퍼스를 만듭니다. 코퍼스는 외부 QA
//! 서비스가 질의응답에 사용합니다.

pub mod cli;
pub mod collector;
pub mod config;
pub mod corpus;
pub mod crawler;
pub mod error;
pub mod qa;
pub mod scraper;

// Re-exports
pub use collector::{InclusionRule, LinkCollector, LinkStrategy};
pub use config::AppConfig;
pub use corpus::{
    corpus_path, Corpus, CorpusBuilder, DocumentRecord, Passage, PassageSplitter,
};
pub use crawler::{CrawlReport, CrawlRequest, Crawler, SkippedPage};
pub use error::{CollectError, ConfigError, CorpusError, ExtractError, FetchError, QaError};
pub use qa::{
    ask, format_reply, parse_structured_answer, HttpQaBackend, QaBackend, QaOutcome,
    QueryOptions, ResponseMode, StructuredAnswer,
};
pub use scraper::{
    ExtractedPage, ExtractorRegistry, PageFetcher, SiteExtractor, WebScraper,
};
