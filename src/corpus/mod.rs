//! 코퍼스 모듈 - 한 번의 크롤링 결과 문서 모음
//!
//! - `DocumentRecord`: 페이지 하나의 정규화된 추출 결과
//! - `CorpusBuilder`: 성공한 페이지에만 1부터 연속된 id 부여
//! - JSON 저장 (임시 파일에 쓴 뒤 교체) / 로드
//! - `PassageSplitter`: 인덱스 시드용 패시지 분할

mod passages;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CorpusError;
use crate::scraper::ExtractedPage;

pub use passages::{Passage, PassageSplitter, DEFAULT_PASSAGE_CHARS};

// ============================================================================
// Types
// ============================================================================

/// 코퍼스 단위 문서
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// 실행 내 1부터 시작하는 순번
    pub id: u32,
    /// 원본 페이지 절대 URL
    #[serde(alias = "doc_link")]
    pub page_link: String,
    pub title: String,
    pub text: String,
    /// 본문 안 상대/프래그먼트 링크 (등장 순서)
    #[serde(default)]
    pub source_links: Vec<String>,
    /// 사이트별 부가 정보 (Substack 제목/저자 등), 없으면 직렬화하지 않음
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// 문서 모음 (JSON 배열로 직렬화)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    documents: Vec<DocumentRecord>,
}

impl Corpus {
    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn into_documents(self) -> Vec<DocumentRecord> {
        self.documents
    }

    /// JSON 문자열로 직렬화 (pretty print 없음)
    pub fn to_json(&self) -> Result<String, CorpusError> {
        Ok(serde_json::to_string(self)?)
    }

    /// JSON 문자열에서 파싱
    pub fn from_json(json: &str) -> Result<Self, CorpusError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 파일로 저장
    ///
    /// 같은 디렉토리의 임시 파일에 먼저 쓰고 rename으로 교체하므로,
    /// 실패해도 기존 코퍼스 파일은 손상되지 않습니다.
    pub fn save(&self, path: &Path) -> Result<(), CorpusError> {
        let io_err = |source: std::io::Error| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let json = self.to_json()?;
        let tmp_path = temp_path_for(path);

        std::fs::write(&tmp_path, json).map_err(io_err)?;
        if let Err(source) = std::fs::rename(&tmp_path, path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(io_err(source));
        }

        tracing::info!("Saved corpus ({} documents) to {:?}", self.len(), path);
        Ok(())
    }

    /// 파일에서 로드
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let json = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

impl FromIterator<DocumentRecord> for Corpus {
    fn from_iter<I: IntoIterator<Item = DocumentRecord>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// ============================================================================
// CorpusBuilder
// ============================================================================

/// 크롤링 중 문서를 모으는 빌더
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    documents: Vec<DocumentRecord>,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 추출 성공한 페이지 추가, 부여된 id 반환
    pub fn push(&mut self, page_link: &str, page: ExtractedPage) -> u32 {
        let id = self.documents.len() as u32 + 1;
        self.documents.push(DocumentRecord {
            id,
            page_link: page_link.to_string(),
            title: page.title,
            text: page.text,
            source_links: page.source_links,
            metadata: page.metadata,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn build(self) -> Corpus {
        Corpus {
            documents: self.documents,
        }
    }
}

// ============================================================================
// Corpus Paths
// ============================================================================

/// 루트 URL에 대응하는 코퍼스 파일 경로
///
/// 호스트의 `.`을 `_`로 바꾼 이름을 사용합니다 (`docs.mono.co` → `docs_mono_co.json`).
/// 같은 루트를 다시 크롤링하면 같은 파일을 덮어씁니다.
pub fn corpus_path(data_dir: &Path, root_url: &str) -> Result<PathBuf, url::ParseError> {
    let url = Url::parse(root_url)?;
    let host = url.host_str().unwrap_or("local").replace('.', "_");
    Ok(data_dir.join(format!("{}.json", host)))
}

/// 데이터 디렉토리의 코퍼스 파일 목록 (이름순)
pub fn list_corpora(data_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !data_dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(data_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    paths.sort();
    Ok(paths)
}

// ============================================================================
// Tests
// ============================================================================
