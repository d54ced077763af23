//! QA 모듈 - 외부 질의응답 백엔드 연동
//!
//! 인덱스/LLM 내부는 외부 서비스가 담당합니다. 여기서는
//! 1. 백엔드 호출 인터페이스 (`QaBackend`)
//! 2. 구조화된 답변의 엄격한 파싱 (문자열을 코드로 평가하지 않음)
//! 3. 채팅 채널용 응답 포맷팅
//!
//! 만 다룹니다. 백엔드 실패나 잘못된 답변은 항상 `QaOutcome::NoAnswer`가 됩니다.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::corpus::{Corpus, DEFAULT_PASSAGE_CHARS};
use crate::error::QaError;

pub use http::HttpQaBackend;

/// 기본 유사도 컷오프
pub const DEFAULT_SIMILARITY_CUTOFF: f32 = 0.8;

// ============================================================================
// Query Options
// ============================================================================

/// 응답 합성 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    Default,
    /// 검색된 패시지를 압축해 한 번에 합성
    #[default]
    Compact,
}

/// 질의 옵션
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// 이 값 미만의 유사도를 가진 패시지는 무시
    pub similarity_cutoff: Option<f32>,
    pub response_mode: ResponseMode,
    /// 인덱스 시드 패시지 최대 길이 (문자 수)
    pub passage_limit: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            similarity_cutoff: Some(DEFAULT_SIMILARITY_CUTOFF),
            response_mode: ResponseMode::Compact,
            passage_limit: DEFAULT_PASSAGE_CHARS,
        }
    }
}

// ============================================================================
// QaBackend Trait
// ============================================================================

/// 외부 QA 백엔드 인터페이스
#[async_trait]
pub trait QaBackend: Send + Sync {
    /// 백엔드 이름
    fn name(&self) -> &str;

    /// 코퍼스에 대한 질의
    ///
    /// 구조화된 답변 원문(JSON 문자열)을 반환하고, 답이 없으면 `None`.
    async fn query(
        &self,
        corpus: &Corpus,
        query: &str,
        options: &QueryOptions,
    ) -> Result<Option<String>, QaError>;
}

// ============================================================================
// Answers
// ============================================================================

/// 구조화된 답변
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredAnswer {
    pub answer: String,
    /// 유효한 URL일 때만 유지
    pub follow_up_url: Option<String>,
}

/// 질의 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QaOutcome {
    Answer(StructuredAnswer),
    /// 확신할 만한 답 없음
    NoAnswer,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnswerEnvelope {
    documentation: AnswerBody,
}

#[derive(Debug, Deserialize)]
struct AnswerBody {
    answer: String,
    #[serde(default)]
    follow_up_url: Option<String>,
}

/// 구조화된 답변 파싱
///
/// 기대 형식: `{"documentation": {"answer": "...", "follow_up_url": "..."}}`
/// - 빈 문자열, `None`, `null`은 답 없음
/// - 유효하지 않은 follow_up_url은 버림
/// - 그 외 형식은 `MalformedAnswer`
pub fn parse_structured_answer(raw: &str) -> Result<Option<StructuredAnswer>, QaError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "None" || raw == "null" {
        return Ok(None);
    }

    let envelope: AnswerEnvelope =
        serde_json::from_str(raw).map_err(|e| QaError::MalformedAnswer(e.to_string()))?;

    let answer = envelope.documentation.answer.trim().to_string();
    if answer.is_empty() {
        return Ok(None);
    }

    let follow_up_url = envelope
        .documentation
        .follow_up_url
        .map(|url| url.trim().to_string())
        .filter(|url| match Url::parse(url) {
            Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
            Err(_) => {
                tracing::debug!("Dropping invalid follow-up url: {}", url);
                false
            }
        });

    Ok(Some(StructuredAnswer {
        answer,
        follow_up_url,
    }))
}

/// 질의 실행 (에러를 반환하지 않음)
pub async fn ask(
    backend: &dyn QaBackend,
    corpus: &Corpus,
    query: &str,
    options: &QueryOptions,
) -> QaOutcome {
    tracing::info!(
        "Querying {} over {} documents: {}",
        backend.name(),
        corpus.len(),
        query
    );

    let raw = match backend.query(corpus, query, options).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return QaOutcome::NoAnswer,
        Err(e) => {
            tracing::warn!("QA backend failed: {}", e);
            return QaOutcome::NoAnswer;
        }
    };

    match parse_structured_answer(&raw) {
        Ok(Some(answer)) => QaOutcome::Answer(answer),
        Ok(None) => QaOutcome::NoAnswer,
        Err(e) => {
            tracing::warn!("{}", e);
            QaOutcome::NoAnswer
        }
    }
}

// ============================================================================
// Reply Formatting
// ============================================================================

/// 채팅 채널용 응답 문자열
pub fn format_reply(outcome: &QaOutcome, docs_url: &str) -> String {
    match outcome {
        QaOutcome::Answer(StructuredAnswer {
            answer,
            follow_up_url: Some(url),
        }) => format!("{} Read more about this here {}", answer, url),
        QaOutcome::Answer(StructuredAnswer { answer, .. }) => answer.clone(),
        QaOutcome::NoAnswer => format!(
            "Hmm, I don't know enough to give you a confident answer yet. \
             However, you can refer to the documentation for more information: {}",
            docs_url
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedBackend(Result<Option<String>, fn() -> QaError>);

    #[async_trait]
    impl QaBackend for CannedBackend {
        fn name(&self) -> &str {
            "canned"
        }

        async fn query(
            &self,
            _corpus: &Corpus,
            _query: &str,
            _options: &QueryOptions,
        ) -> Result<Option<String>, QaError> {
            match &self.0 {
                Ok(raw) => Ok(raw.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn canned(raw: &str) -> CannedBackend {
        CannedBackend(Ok(Some(raw.to_string())))
    }

    #[test]
    fn test_parse_full_answer() {
        let raw = r#"{"documentation": {"answer": "Use CREATE MODEL.", "follow_up_url": "https://docs.mindsdb.com/sql/create/model"}}"#;
        let parsed = parse_structured_answer(raw).expect("parse");
        assert_eq!(
            parsed,
            Some(StructuredAnswer {
                answer: "Use CREATE MODEL.".to_string(),
                follow_up_url: Some("https://docs.mindsdb.com/sql/create/model".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_no_answer_sentinels() {
        for raw in ["", "  ", "None", "null"] {
            assert_eq!(parse_structured_answer(raw).expect("parse"), None);
        }
        let blank = r#"{"documentation": {"answer": "  "}}"#;
        assert_eq!(parse_structured_answer(blank).expect("parse"), None);
    }

    #[test]
    fn test_invalid_follow_up_url_filtered() {
        let raw = r#"{"documentation": {"answer": "Yes.", "follow_up_url": "see the docs"}}"#;
        let parsed = parse_structured_answer(raw).expect("parse").expect("answer");
        assert_eq!(parsed.follow_up_url, None);

        let raw = r#"{"documentation": {"answer": "Yes.", "follow_up_url": "javascript:alert(1)"}}"#;
        let parsed = parse_structured_answer(raw).expect("parse").expect("answer");
        assert_eq!(parsed.follow_up_url, None);
    }

    #[test]
    fn test_malformed_answers_rejected() {
        let cases = [
            "{'documentation': {'answer': 'python dict'}}",
            r#"{"answer": "flat"}"#,
            r#"{"documentation": {"follow_up_url": "https://x.test"}}"#,
            "__import__('os').system('rm -rf /')",
        ];
        for raw in cases {
            assert!(matches!(
                parse_structured_answer(raw),
                Err(QaError::MalformedAnswer(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_ask_outcomes() {
        let corpus = Corpus::default();
        let options = QueryOptions::default();

        let outcome = ask(
            &canned(r#"{"documentation": {"answer": "42"}}"#),
            &corpus,
            "q",
            &options,
        )
        .await;
        assert!(matches!(outcome, QaOutcome::Answer(ref a) if a.answer == "42"));

        let outcome = ask(&canned("not json"), &corpus, "q", &options).await;
        assert_eq!(outcome, QaOutcome::NoAnswer);

        let outcome = ask(&CannedBackend(Ok(None)), &corpus, "q", &options).await;
        assert_eq!(outcome, QaOutcome::NoAnswer);

        let server_error: fn() -> QaError = || QaError::Status(500);
        let failing = CannedBackend(Err(server_error));
        let outcome = ask(&failing, &corpus, "q", &options).await;
        assert_eq!(outcome, QaOutcome::NoAnswer);
    }

    #[test]
    fn test_format_reply() {
        let with_url = QaOutcome::Answer(StructuredAnswer {
            answer: "Call /charge.".to_string(),
            follow_up_url: Some("https://paystack.com/docs/api".to_string()),
        });
        assert_eq!(
            format_reply(&with_url, "https://paystack.com/docs"),
            "Call /charge. Read more about this here https://paystack.com/docs/api"
        );

        let without_url = QaOutcome::Answer(StructuredAnswer {
            answer: "Call /charge.".to_string(),
            follow_up_url: None,
        });
        assert_eq!(format_reply(&without_url, "https://x.test"), "Call /charge.");

        let none = format_reply(&QaOutcome::NoAnswer, "https://docs.mindsdb.com/");
        assert!(none.starts_with("Hmm, I don't know enough"));
        assert!(none.ends_with("for more information: https://docs.mindsdb.com/"));
    }

    #[test]
    fn test_default_options() {
        let options = QueryOptions::default();
        assert_eq!(options.similarity_cutoff, Some(0.8));
        assert_eq!(options.response_mode, ResponseMode::Compact);
    }
}
