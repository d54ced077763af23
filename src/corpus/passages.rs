//! 패시지 분할 - 인덱스 시드용
//!
//! 추출된 텍스트는 한 줄짜리 산문 사이에 펜스 코드 블록이 끼어 있는 형태입니다.
//! 코드 블록은 절대 자르지 않고, 산문은 공백 경계에서 자릅니다.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Corpus, DocumentRecord};

/// 기본 패시지 최대 길이 (문자 수)
pub const DEFAULT_PASSAGE_CHARS: usize = 2048;

const FENCE: &str = "```";

/// QA 백엔드에 넘기는 패시지
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Passage {
    pub doc_id: u32,
    pub page_link: String,
    pub title: String,
    pub text: String,
    /// 원본 문서의 부가 정보 (인덱스 문서 메타데이터로 전달)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// 패시지 분할기
#[derive(Debug, Clone)]
pub struct PassageSplitter {
    max_chars: usize,
}

impl Default for PassageSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_PASSAGE_CHARS)
    }
}

impl PassageSplitter {
    /// 최대 길이 지정 (0이면 1로 보정)
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    /// 코퍼스 전체를 패시지로
    pub fn split_corpus(&self, corpus: &Corpus) -> Vec<Passage> {
        corpus
            .documents()
            .iter()
            .flat_map(|doc| self.split_document(doc))
            .collect()
    }

    /// 문서 하나를 패시지로
    pub fn split_document(&self, doc: &DocumentRecord) -> Vec<Passage> {
        self.split(&doc.text)
            .into_iter()
            .map(|text| Passage {
                doc_id: doc.id,
                page_link: doc.page_link.clone(),
                title: doc.title.clone(),
                text,
                metadata: doc.metadata.clone(),
            })
            .collect()
    }

    /// 텍스트 분할
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        for segment in segments(text) {
            match segment {
                Segment::Code(code) => pieces.push(code.to_string()),
                Segment::Prose(prose) => pieces.extend(self.split_prose(prose)),
            }
        }
        self.pack(pieces)
    }

    /// 산문을 단어 경계에서 분할 (너무 긴 단어는 문자 경계에서 강제 분할)
    fn split_prose(&self, prose: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for word in prose.split_whitespace() {
            let mut word = word;
            while word.chars().count() > self.max_chars {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                let cut = byte_offset_of_char(word, self.max_chars);
                chunks.push(word[..cut].to_string());
                word = &word[cut..];
            }

            if !current.is_empty()
                && current.chars().count() + 1 + word.chars().count() > self.max_chars
            {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// 조각들을 최대 길이 안에서 이어 붙이기
    fn pack(&self, pieces: Vec<String>) -> Vec<String> {
        let mut result: Vec<String> = Vec::new();
        let mut current = String::new();

        for piece in pieces {
            if piece.trim().is_empty() {
                continue;
            }
            if !current.is_empty()
                && current.chars().count() + 1 + piece.chars().count() > self.max_chars
            {
                result.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(&piece);
        }

        if !current.is_empty() {
            result.push(current);
        }
        result
    }
}

enum Segment<'a> {
    Prose(&'a str),
    Code(&'a str),
}

/// 펜스 코드 블록과 산문으로 나누기 (닫히지 않은 펜스는 산문으로 취급)
fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut result = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(FENCE) {
        let after_open = start + FENCE.len();
        let Some(close) = rest[after_open..].find(FENCE) else {
            break;
        };
        let end = after_open + close + FENCE.len();

        if start > 0 {
            result.push(Segment::Prose(&rest[..start]));
        }
        result.push(Segment::Code(&rest[start..end]));
        rest = &rest[end..];
    }

    if !rest.is_empty() {
        result.push(Segment::Prose(rest));
    }
    result
}

/// n번째 문자의 바이트 오프셋 (UTF-8 경계)
#[inline]
fn byte_offset_of_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert!(PassageSplitter::default().split("").is_empty());
        assert!(PassageSplitter::default().split("   ").is_empty());
    }

    #[test]
    fn test_short_text_single_passage() {
        let passages = PassageSplitter::default().split("Hello world ");
        assert_eq!(passages, vec!["Hello world"]);
    }

    #[test]
    fn test_prose_split_at_whitespace() {
        let splitter = PassageSplitter::new(11);
        let passages = splitter.split("alpha beta gamma delta");
        assert_eq!(passages, vec!["alpha beta", "gamma delta"]);
        assert!(passages.iter().all(|p| p.chars().count() <= 11));
    }

    #[test]
    fn test_code_block_never_split() {
        let splitter = PassageSplitter::new(10);
        let text = "Run this: \n```\nprint('a very long line of code')\n```";
        let passages = splitter.split(text);

        assert!(passages
            .iter()
            .any(|p| p == "```\nprint('a very long line of code')\n```"));
    }

    #[test]
    fn test_long_word_split_on_char_boundary() {
        let splitter = PassageSplitter::new(3);
        let passages = splitter.split("세계세계세계세");
        assert_eq!(passages, vec!["세계세", "계세계", "세"]);
    }

    #[test]
    fn test_unclosed_fence_is_prose() {
        let passages = PassageSplitter::default().split("before ``` after");
        assert_eq!(passages, vec!["before ``` after"]);
    }

    #[test]
    fn test_split_document_carries_metadata() {
        let doc = DocumentRecord {
            id: 7,
            page_link: "https://x.test/p".to_string(),
            title: "P".to_string(),
            text: "one two three".to_string(),
            source_links: vec![],
            metadata: BTreeMap::from([("Author".to_string(), "Ada".to_string())]),
        };
        let passages = PassageSplitter::new(7).split_document(&doc);

        assert_eq!(passages.len(), 2);
        assert!(passages.iter().all(|p| p.doc_id == 7 && p.title == "P"));
        assert!(passages
            .iter()
            .all(|p| p.metadata.get("Author").map(String::as_str) == Some("Ada")));
    }
}
