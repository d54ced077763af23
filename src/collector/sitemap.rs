//! Sitemap 파싱
//!
//! `<urlset><url><loc>...</loc></url></urlset>` 형식에서 `<loc>` 값만 문서 순서대로 뽑습니다.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::CollectError;

/// urlset XML에서 `<url>`마다 첫 번째 `<loc>` 값 추출
///
/// `<url>`의 직계 자식 `<loc>`만 페이지 URL로 취급합니다.
/// `<image:image><image:loc>` 같은 확장 항목 안의 `loc`은 무시합니다.
pub fn parse_urlset(xml: &str) -> Result<Vec<String>, CollectError> {
    let mut reader = Reader::from_str(xml);
    let mut urls = Vec::new();
    let mut depth = 0usize;
    // 현재 열려 있는 `<url>`의 깊이
    let mut url_depth: Option<usize> = None;
    let mut loc_taken = false;
    let mut in_loc = false;
    let mut loc = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"url" if url_depth.is_none() => {
                        url_depth = Some(depth);
                        loc_taken = false;
                    }
                    b"loc" if !loc_taken && url_depth.map(|d| d + 1) == Some(depth) => {
                        in_loc = true;
                        loc.clear();
                    }
                    _ => {}
                }
            }
            Event::Text(e) if in_loc => loc.push_str(&e.unescape()?),
            Event::CData(e) if in_loc => loc.push_str(&String::from_utf8_lossy(&e)),
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"loc" if in_loc => {
                        in_loc = false;
                        loc_taken = true;
                        let value = loc.trim();
                        if !value.is_empty() {
                            urls.push(value.to_string());
                        }
                    }
                    b"url" if url_depth == Some(depth) => url_depth = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(urls)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlset_in_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>https://docs.example.com/a</loc><lastmod>2023-01-01</lastmod></url>
                <url>
                    <loc>
                        https://docs.example.com/b
                    </loc>
                </url>
                <url><loc>https://docs.example.com/c?x=1&amp;y=2</loc></url>
            </urlset>"#;

        let urls = parse_urlset(xml).expect("parse");
        assert_eq!(
            urls,
            vec![
                "https://docs.example.com/a",
                "https://docs.example.com/b",
                "https://docs.example.com/c?x=1&y=2",
            ]
        );
    }

    #[test]
    fn test_loc_outside_url_ignored() {
        let xml = r#"<sitemapindex><sitemap><loc>https://x.test/sitemap-1.xml</loc></sitemap></sitemapindex>"#;
        assert!(parse_urlset(xml).expect("parse").is_empty());
    }

    #[test]
    fn test_prefixed_tags() {
        let xml = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9"><sm:url><sm:loc>https://x.test/p</sm:loc></sm:url></sm:urlset>"#;
        assert_eq!(parse_urlset(xml).expect("parse"), vec!["https://x.test/p"]);
    }

    #[test]
    fn test_image_sitemap_entries_ignored() {
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
                xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
                <url>
                    <loc>https://x.test/page</loc>
                    <image:image><image:loc>https://x.test/img.png</image:loc></image:image>
                </url>
                <url>
                    <image:image><image:loc>https://x.test/first.png</image:loc></image:image>
                    <loc>https://x.test/other</loc>
                </url>
            </urlset>"#;
        assert_eq!(
            parse_urlset(xml).expect("parse"),
            vec!["https://x.test/page", "https://x.test/other"]
        );
    }

    #[test]
    fn test_first_loc_per_url() {
        let xml = "<urlset><url><loc>https://x.test/a</loc><loc>https://x.test/dup</loc></url></urlset>";
        assert_eq!(parse_urlset(xml).expect("parse"), vec!["https://x.test/a"]);
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let xml = "<urlset><url><loc>https://x.test/a</loc></url></wrong>";
        assert!(matches!(parse_urlset(xml), Err(CollectError::Xml(_))));
    }
}
