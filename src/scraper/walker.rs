//! DOM 워커 - 본문 컨테이너를 깊이 우선으로 순회하며 텍스트 생성
//!
//! 노드 규칙:
//! - `href`가 있는 `<a>`: 링크 분류 후 텍스트 + (상대/프래그먼트면) 참조 주석
//! - 코드 블록 래퍼: 내부 코드 요소를 펜스 블록으로 그대로 보존
//! - 텍스트 노드: 공백 제거 후 뒤에 공백 하나
//! - 그 외 요소: 자체 출력 없음, 자식은 계속 순회

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::error::ExtractError;

/// 텍스트를 만들지 않는 태그 (하위 트리 전체 무시)
const SKIPPED_TAGS: [&str; 3] = ["script", "style", "noscript"];

// ============================================================================
// Rules
// ============================================================================

/// 셀렉터 파싱 (에러를 ExtractError로 변환)
pub fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// 코드 블록 규칙: 마커 클래스를 가진 래퍼 요소 + 내부 코드 요소
#[derive(Debug, Clone)]
pub struct CodeBlockRule {
    wrapper_tag: &'static str,
    marker_class: &'static str,
    code_tag: &'static str,
    code_selector: Selector,
}

impl CodeBlockRule {
    pub fn new(
        wrapper_tag: &'static str,
        marker_class: &'static str,
        code_tag: &'static str,
    ) -> Result<Self, ExtractError> {
        Ok(Self {
            wrapper_tag,
            marker_class,
            code_tag,
            code_selector: parse_selector(code_tag)?,
        })
    }

    fn matches(&self, element: &scraper::node::Element) -> bool {
        element.name() == self.wrapper_tag && element.classes().any(|c| c == self.marker_class)
    }
}

/// 사이트별 본문 규칙
#[derive(Debug, Clone)]
pub struct ContentRules {
    container: String,
    container_selector: Selector,
    code_block: Option<CodeBlockRule>,
}

impl ContentRules {
    /// 본문 컨테이너 셀렉터로 규칙 생성
    pub fn new(container: &str) -> Result<Self, ExtractError> {
        Ok(Self {
            container: container.to_string(),
            container_selector: parse_selector(container)?,
            code_block: None,
        })
    }

    /// 코드 블록 규칙 추가
    pub fn with_code_blocks(mut self, rule: CodeBlockRule) -> Self {
        self.code_block = Some(rule);
        self
    }

    /// 컨테이너 셀렉터 문자열
    pub fn container(&self) -> &str {
        &self.container
    }
}

// ============================================================================
// Walk Output
// ============================================================================

/// 순회 결과
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkOutput {
    /// 누적된 텍스트
    pub text: String,
    /// 상대/프래그먼트 링크 (등장 순서, 중복 허용)
    pub source_links: Vec<String>,
}

/// 컨테이너를 찾아 순회
///
/// 일치하는 컨테이너가 여러 개면 문서 순서대로 모두 순회합니다.
/// 하나도 없으면 `MissingMainContent`를 반환합니다.
pub fn walk_document(
    document: &Html,
    rules: &ContentRules,
    page_url: &str,
) -> Result<WalkOutput, ExtractError> {
    let mut walker = ContentWalker::new(rules, page_url);
    let mut found = false;

    for container in document.select(&rules.container_selector) {
        found = true;
        walker.visit_children(container)?;
    }

    if !found {
        return Err(ExtractError::MissingMainContent {
            selector: rules.container.clone(),
        });
    }

    Ok(walker.finish())
}

// ============================================================================
// ContentWalker
// ============================================================================

struct ContentWalker<'r> {
    rules: &'r ContentRules,
    page_url: &'r str,
    output: WalkOutput,
}

impl<'r> ContentWalker<'r> {
    fn new(rules: &'r ContentRules, page_url: &'r str) -> Self {
        Self {
            rules,
            page_url,
            output: WalkOutput::default(),
        }
    }

    fn finish(self) -> WalkOutput {
        self.output
    }

    fn visit_children(&mut self, element: ElementRef<'_>) -> Result<(), ExtractError> {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.visit_element(child)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn visit_element(&mut self, element: ElementRef<'_>) -> Result<(), ExtractError> {
        let value = element.value();

        if SKIPPED_TAGS.contains(&value.name()) {
            return Ok(());
        }

        if value.name() == "a" {
            if let Some(href) = value.attr("href") {
                let visible: String = element.text().collect();
                self.push_anchor(href, &visible);
                return Ok(());
            }
        }

        if let Some(rule) = &self.rules.code_block {
            if rule.matches(value) {
                let code = element.select(&rule.code_selector).next().ok_or_else(|| {
                    ExtractError::MissingCodeElement {
                        tag: rule.code_tag.to_string(),
                    }
                })?;
                let code: String = code.text().collect();
                self.push_code(&code);
                return Ok(());
            }
        }

        self.visit_children(element)
    }

    fn push_text(&mut self, text: &str) {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            self.output.text.push_str(trimmed);
            self.output.text.push(' ');
        }
    }

    fn push_anchor(&mut self, href: &str, visible: &str) {
        match classify_href(href) {
            LinkKind::Edit => self.output.text.push_str(visible),
            LinkKind::Internal => {
                self.output.text.push_str(&format!(
                    "{} (Reference url: {}{}) ",
                    visible, self.page_url, href
                ));
                self.output.source_links.push(href.to_string());
            }
            LinkKind::External => {
                self.output.text.push_str(visible);
                self.output.text.push(' ');
            }
        }
    }

    fn push_code(&mut self, code: &str) {
        self.output.text.push_str("\n```\n");
        self.output.text.push_str(code);
        self.output.text.push_str("\n```");
    }
}

/// 요소 아래 보이는 텍스트 조각 (공백 제거, 건너뛰는 태그 제외)
pub fn visible_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed);
                }
            }
            Node::Element(value) if !SKIPPED_TAGS.contains(&value.name()) => {
                if let Some(child) = ElementRef::wrap(child) {
                    visible_text(child, out);
                }
            }
            _ => {}
        }
    }
}

// ============================================================================
// Link Classification
// ============================================================================

/// 본문 안 링크 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// "이 페이지 편집" 류 링크 - 텍스트만 사용
    Edit,
    /// 사이트 상대 경로 또는 프래그먼트 - 참조 주석 + source_links 기록
    Internal,
    /// 외부 절대 링크 - 텍스트만 사용
    External,
}

/// href 분류 (edit 검사가 우선)
pub fn classify_href(href: &str) -> LinkKind {
    if href.contains("edit") {
        LinkKind::Edit
    } else if href.starts_with('/') || href.contains('#') {
        LinkKind::Internal
    } else {
        LinkKind::External
    }
}

// ============================================================================
// Tests
// ============================================================================
