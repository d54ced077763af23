//! HTTP QA 백엔드
//!
//! 외부 QA 서비스에 패시지와 질의를 JSON으로 보내고
//! `{"response": string | null}` 형식의 응답을 받습니다.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::AppConfig;
use crate::corpus::{Corpus, Passage, PassageSplitter};
use crate::error::QaError;

use super::{QaBackend, QueryOptions, ResponseMode};

/// LLM 합성은 크롤링보다 오래 걸릴 수 있음
const QA_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    similarity_cutoff: Option<f32>,
    response_mode: ResponseMode,
    passages: Vec<Passage>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    response: serde_json::Value,
}

/// HTTP 기반 QA 백엔드
pub struct HttpQaBackend {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpQaBackend {
    pub fn new(endpoint: Url, api_key: Option<String>) -> Result<Self, QaError> {
        let client = reqwest::Client::builder().timeout(QA_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// 설정에서 생성 (엔드포인트 미설정이면 `NotConfigured`)
    pub fn from_config(config: &AppConfig) -> Result<Self, QaError> {
        let endpoint = config.qa_endpoint.clone().ok_or(QaError::NotConfigured)?;
        Self::new(endpoint, config.qa_api_key.clone())
    }

    /// 질의 엔드포인트 (`<base>/query`)
    fn query_url(&self) -> String {
        let base = self.endpoint.as_str().trim_end_matches('/');
        if base.ends_with("/query") {
            base.to_string()
        } else {
            format!("{}/query", base)
        }
    }
}

fn build_request<'a>(corpus: &Corpus, query: &'a str, options: &QueryOptions) -> QueryRequest<'a> {
    QueryRequest {
        query,
        similarity_cutoff: options.similarity_cutoff,
        response_mode: options.response_mode,
        passages: PassageSplitter::new(options.passage_limit).split_corpus(corpus),
    }
}

/// 응답 본문의 `response` 필드를 답변 원문으로
fn response_text(body: QueryResponse) -> Option<String> {
    match body.response {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl QaBackend for HttpQaBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn query(
        &self,
        corpus: &Corpus,
        query: &str,
        options: &QueryOptions,
    ) -> Result<Option<String>, QaError> {
        let body = build_request(corpus, query, options);
        tracing::debug!("Sending {} passages to {}", body.passages.len(), self.query_url());

        let mut request = self.client.post(self.query_url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(QaError::Status(status.as_u16()));
        }

        let body: QueryResponse = response.json().await?;
        Ok(response_text(body))
    }
}

// ============================================================================
// Tests
// ============================================================================
