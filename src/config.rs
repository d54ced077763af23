//! 설정 모듈
//!
//! 환경변수는 시작 시 한 번만 읽고 검증합니다.
//! 이후 각 컴포넌트는 생성 시점에 필요한 값만 넘겨받습니다.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

const DATA_DIR_KEY: &str = "DOCS_QA_DATA_DIR";
const USER_AGENT_KEY: &str = "DOCS_QA_USER_AGENT";
const TIMEOUT_KEY: &str = "DOCS_QA_HTTP_TIMEOUT";
const ENDPOINT_KEY: &str = "DOCS_QA_ENDPOINT";
const API_KEY_KEYS: [&str; 2] = ["DOCS_QA_API_KEY", "OPENAI_API_KEY"];

/// 기본 HTTP 타임아웃 (초)
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Data Directory
// ============================================================================

/// 기본 데이터 디렉토리 경로 (~/.docs-qa/)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".docs-qa")
}

// ============================================================================
// AppConfig
// ============================================================================

/// 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 코퍼스 JSON 저장 디렉토리
    pub data_dir: PathBuf,
    /// 크롤링 시 사용할 User-Agent
    pub user_agent: String,
    /// 요청당 타임아웃
    pub http_timeout: Duration,
    /// 외부 QA 서비스 주소 (없으면 ask 비활성)
    pub qa_endpoint: Option<Url>,
    /// QA 서비스 bearer 토큰
    pub qa_api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            user_agent: default_user_agent(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            qa_endpoint: None,
            qa_api_key: None,
        }
    }
}

impl AppConfig {
    /// `.env` 파일과 프로세스 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Failed to load .env file: {}", e);
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 키 조회 함수로 설정 생성
    ///
    /// 빈 문자열 값은 미설정으로 취급합니다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir = get(DATA_DIR_KEY)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let user_agent = get(USER_AGENT_KEY).unwrap_or_else(default_user_agent);

        let http_timeout = match get(TIMEOUT_KEY) {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        key: TIMEOUT_KEY,
                        value,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let qa_endpoint = match get(ENDPOINT_KEY) {
            Some(value) => Some(Url::parse(&value).map_err(|source| ConfigError::InvalidUrl {
                key: ENDPOINT_KEY,
                value: value.clone(),
                source,
            })?),
            None => None,
        };

        let qa_api_key = API_KEY_KEYS.iter().find_map(|key| get(key));

        Ok(Self {
            data_dir,
            user_agent,
            http_timeout,
            qa_endpoint,
            qa_api_key,
        })
    }
}

fn default_user_agent() -> String {
    format!("docs-qa/{}", env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.qa_endpoint.is_none());
        assert!(config.qa_api_key.is_none());
        assert!(config.user_agent.starts_with("docs-qa/"));
        assert!(config.data_dir.ends_with(".docs-qa"));
    }

    #[test]
    fn test_explicit_values() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DOCS_QA_DATA_DIR", "/tmp/corpora"),
            ("DOCS_QA_HTTP_TIMEOUT", "5"),
            ("DOCS_QA_ENDPOINT", "http://localhost:8000"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .expect("config");

        assert_eq!(config.data_dir, PathBuf::from("/tmp/corpora"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(
            config.qa_endpoint.as_ref().map(|u| u.as_str()),
            Some("http://localhost:8000/")
        );
        assert_eq!(config.qa_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_api_key_precedence() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DOCS_QA_API_KEY", "primary"),
            ("OPENAI_API_KEY", "fallback"),
        ]))
        .expect("config");
        assert_eq!(config.qa_api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        for bad in ["0", "abc", "-3"] {
            let result = AppConfig::from_lookup(lookup(&[("DOCS_QA_HTTP_TIMEOUT", bad)]));
            assert!(matches!(result, Err(ConfigError::InvalidTimeout { .. })));
        }
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let result = AppConfig::from_lookup(lookup(&[("DOCS_QA_ENDPOINT", "not a url")]));
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = AppConfig::from_lookup(lookup(&[("DOCS_QA_ENDPOINT", "   ")]))
            .expect("config");
        assert!(config.qa_endpoint.is_none());
    }
}
