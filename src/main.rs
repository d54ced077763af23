//! docs-qa CLI 진입점

use anyhow::{Context, Result};
use clap::Parser;

fn main() -> Result<()> {
    // 로깅 초기화
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = docs_qa::cli::Cli::parse();
    let config = docs_qa::AppConfig::from_env().context("설정 로드 실패")?;

    // CLI 실행
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(docs_qa::cli::run(cli, config))
}
