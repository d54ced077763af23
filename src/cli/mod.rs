//! CLI 모듈
//!
//! docs-qa CLI 명령어 정의 및 구현

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::collector::{InclusionRule, LinkStrategy};
use crate::config::AppConfig;
use crate::corpus::{corpus_path, list_corpora, Corpus};
use crate::crawler::{CrawlRequest, Crawler};
use crate::qa::{ask, format_reply, HttpQaBackend, QueryOptions, ResponseMode};
use crate::scraper::{ExtractorRegistry, WebScraper};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "docs-qa")]
#[command(version, about = "문서 사이트 크롤링 + 질의응답", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 코퍼스 지정 (루트 URL 또는 파일 경로 중 하나)
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct CorpusSource {
    /// 크롤링했던 루트 URL (데이터 디렉토리의 코퍼스 사용)
    #[arg(short, long)]
    pub url: Option<String>,

    /// 코퍼스 JSON 파일 경로
    #[arg(short, long)]
    pub corpus: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 문서 사이트를 크롤링해 코퍼스 생성
    Crawl {
        /// 루트 URL
        root_url: String,

        /// 추출기 선택용 호스트 이름 (커스텀 도메인일 때)
        #[arg(short, long)]
        site: Option<String>,

        /// 사이트맵 URL (링크 수집 전략 강제)
        #[arg(long, conflicts_with = "follow")]
        sitemap: Option<String>,

        /// href에 이 문자열이 포함된 링크만 따라가기
        #[arg(long)]
        follow: Option<String>,

        /// 최대 페이지 수
        #[arg(short, long)]
        limit: Option<usize>,

        /// 출력 파일 경로 (기본: 데이터 디렉토리)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 코퍼스가 이미 있어도 다시 크롤링
        #[arg(long)]
        force: bool,
    },

    /// 코퍼스에 질의
    Ask {
        /// 질문
        query: String,

        #[command(flatten)]
        source: CorpusSource,

        /// 유사도 컷오프 (0.0 ~ 1.0)
        #[arg(long, default_value = "0.8")]
        similarity_cutoff: f32,

        /// 압축 없이 전체 패시지로 답변 합성
        #[arg(long)]
        verbose_mode: bool,

        /// 답이 없을 때 안내할 문서 URL (기본: 루트 URL)
        #[arg(long)]
        docs_url: Option<String>,
    },

    /// 코퍼스 문서 목록
    List {
        #[command(flatten)]
        source: CorpusSource,

        /// 결과 개수 제한
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Commands::Crawl {
            root_url,
            site,
            sitemap,
            follow,
            limit,
            output,
            force,
        } => {
            let strategy = explicit_strategy(sitemap, follow);
            cmd_crawl(&config, root_url, site, strategy, limit, output, force).await
        }
        Commands::Ask {
            query,
            source,
            similarity_cutoff,
            verbose_mode,
            docs_url,
        } => {
            cmd_ask(
                &config,
                &query,
                &source,
                similarity_cutoff,
                verbose_mode,
                docs_url,
            )
            .await
        }
        Commands::List { source, limit } => cmd_list(&config, &source, limit),
        Commands::Status => cmd_status(&config),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 크롤링 명령어 (crawl)
///
/// 링크를 수집하고 페이지마다 본문을 추출해 코퍼스 JSON으로 저장합니다.
async fn cmd_crawl(
    config: &AppConfig,
    root_url: String,
    site: Option<String>,
    strategy: Option<LinkStrategy>,
    limit: Option<usize>,
    output: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let path = match output {
        Some(path) => path,
        None => corpus_path(&config.data_dir, &root_url)
            .with_context(|| format!("잘못된 루트 URL: {}", root_url))?,
    };

    if path.exists() && !force {
        println!("[!] 코퍼스가 이미 있습니다: {}", path.display());
        println!("    다시 크롤링하려면 --force 를 지정하세요");
        return Ok(());
    }

    println!("[*] 크롤링 중: {}", root_url);

    let scraper = WebScraper::from_config(config).context("WebScraper 생성 실패")?;
    let registry = ExtractorRegistry::with_defaults().context("추출기 레지스트리 생성 실패")?;
    let crawler = Crawler::new(scraper, registry);

    let request = CrawlRequest {
        root_url: root_url.clone(),
        hostname_override: site,
        strategy,
        max_pages: limit,
    };
    let report = crawler.crawl(&request).await.context("링크 수집 실패")?;

    let elapsed = report.finished_at - report.started_at;
    println!(
        "[*] 추출기: {} | 시도 {} | 성공 {} | 건너뜀 {} ({}s)",
        report.extractor,
        report.attempted,
        report.succeeded(),
        report.skipped.len(),
        elapsed.num_seconds()
    );

    if report.corpus.is_empty() {
        bail!("추출된 문서가 없습니다: {}", root_url);
    }

    report
        .corpus
        .save(&path)
        .with_context(|| format!("코퍼스 저장 실패: {}", path.display()))?;

    println!("[OK] 코퍼스 저장됨 ({} 문서)", report.corpus.len());
    println!("     경로: {}", path.display());

    Ok(())
}

/// 질의 명령어 (ask)
///
/// 외부 QA 서비스에 코퍼스와 질문을 보내고 채팅용 답변을 출력합니다.
async fn cmd_ask(
    config: &AppConfig,
    query: &str,
    source: &CorpusSource,
    similarity_cutoff: f32,
    verbose_mode: bool,
    docs_url: Option<String>,
) -> Result<()> {
    if !(0.0..=1.0).contains(&similarity_cutoff) {
        bail!("--similarity-cutoff 는 0.0 ~ 1.0 사이여야 합니다");
    }

    let backend = HttpQaBackend::from_config(config).context(
        "QA 서비스가 설정되지 않았습니다.\n\
         설정: export DOCS_QA_ENDPOINT=http://localhost:8000",
    )?;

    let path = resolve_corpus_path(config, source)?;
    let corpus = load_corpus(&path)?;

    let docs_url = docs_url
        .or_else(|| source.url.clone())
        .or_else(|| corpus.documents().first().map(|d| site_root(&d.page_link)))
        .unwrap_or_default();

    let options = QueryOptions {
        similarity_cutoff: Some(similarity_cutoff),
        response_mode: if verbose_mode {
            ResponseMode::Default
        } else {
            ResponseMode::Compact
        },
        ..Default::default()
    };

    println!("[*] 질의 중: \"{}\" ({} 문서)", query, corpus.len());

    let outcome = ask(&backend, &corpus, query, &options).await;
    println!();
    println!("{}", format_reply(&outcome, &docs_url));

    Ok(())
}

/// 목록 명령어 (list)
fn cmd_list(config: &AppConfig, source: &CorpusSource, limit: usize) -> Result<()> {
    let path = resolve_corpus_path(config, source)?;
    let corpus = load_corpus(&path)?;

    if corpus.is_empty() {
        println!("[!] 코퍼스에 문서가 없습니다.");
        return Ok(());
    }

    println!(
        "[OK] {} ({} 건 중 {} 건 표시):\n",
        path.display(),
        corpus.len(),
        corpus.len().min(limit)
    );

    for doc in corpus.documents().iter().take(limit) {
        println!("  #{:<4} {}", doc.id, truncate_text(&doc.title, 60));
        println!("        URL: {}", doc.page_link);
        println!(
            "        {} chars | 참조 링크 {} 개",
            doc.text.chars().count(),
            doc.source_links.len()
        );
        println!("        {}", truncate_text(&doc.text, 100));
        println!();
    }

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(config: &AppConfig) -> Result<()> {
    println!("docs-qa v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 데이터 디렉토리: {}", config.data_dir.display());

    match &config.qa_endpoint {
        Some(endpoint) => {
            println!("[OK] QA 서비스: {}", endpoint);
            if config.qa_api_key.is_some() {
                println!("[OK] API 키: 설정됨");
            } else {
                println!("[!] API 키: 미설정");
            }
        }
        None => {
            println!("[!] QA 서비스: 미설정 (ask 비활성)");
            println!("    설정: export DOCS_QA_ENDPOINT=http://localhost:8000");
        }
    }

    let corpora = list_corpora(&config.data_dir).context("데이터 디렉토리 조회 실패")?;
    if corpora.is_empty() {
        println!("[!] 저장된 코퍼스: 없음");
        return Ok(());
    }

    println!("[OK] 저장된 코퍼스: {} 개", corpora.len());
    for path in corpora {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = std::fs::metadata(&path).map(|m| m.len() as usize).unwrap_or(0);

        match Corpus::load(&path) {
            Ok(corpus) => println!(
                "     {} | {} 문서 | {}",
                name,
                corpus.len(),
                format_bytes(size)
            ),
            Err(e) => {
                tracing::debug!("코퍼스 로드 실패 {:?}: {}", path, e);
                println!("     {} | 읽을 수 없음 | {}", name, format_bytes(size));
            }
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// `--sitemap` / `--follow` 옵션을 링크 수집 전략으로
fn explicit_strategy(sitemap: Option<String>, follow: Option<String>) -> Option<LinkStrategy> {
    match (sitemap, follow) {
        (Some(sitemap_url), _) => Some(LinkStrategy::Sitemap { sitemap_url }),
        (None, Some(pattern)) => Some(LinkStrategy::Anchors(InclusionRule::PathContains(pattern))),
        (None, None) => None,
    }
}

fn resolve_corpus_path(config: &AppConfig, source: &CorpusSource) -> Result<PathBuf> {
    match (&source.corpus, &source.url) {
        (Some(path), _) => Ok(path.clone()),
        (None, Some(url)) => corpus_path(&config.data_dir, url)
            .with_context(|| format!("잘못된 루트 URL: {}", url)),
        (None, None) => bail!("--url 또는 --corpus 중 하나를 지정해야 합니다"),
    }
}

fn load_corpus(path: &Path) -> Result<Corpus> {
    if !path.exists() {
        bail!(
            "코퍼스를 찾을 수 없습니다: {}\n먼저 `docs-qa crawl` 을 실행하세요",
            path.display()
        );
    }
    Corpus::load(path).with_context(|| format!("코퍼스 로드 실패: {}", path.display()))
}

/// 페이지 URL의 사이트 루트 (`https://host/`)
fn site_root(page_link: &str) -> String {
    match Url::parse(page_link) {
        Ok(mut url) => {
            url.set_path("/");
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => page_link.to_string(),
    }
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
