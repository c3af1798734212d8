//! HTML helpers for menu listing pages
//!
//! Link discovery on a provider's listing page and plain-text extraction of
//! a page fragment for providers that publish the menu as HTML.

use crate::infrastructure::config::LinkDiscovery;
use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

static PDF_ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)="([^"]+\.pdf)""#).expect("static pattern"));

/// Document URLs found on a listing page, absolute and de-duplicated in page order
pub fn discover_links(html: &str, base_url: &str, discovery: &LinkDiscovery) -> ParsingResult<Vec<String>> {
    let base = Url::parse(base_url).map_err(|e| ParsingError::UrlResolutionFailed {
        url: base_url.to_string(),
        reason: e.to_string(),
        base_url: None,
    })?;

    let candidates: Vec<String> = match discovery {
        LinkDiscovery::ListingPage => return Ok(vec![base.to_string()]),
        LinkDiscovery::PdfHrefPattern => PDF_ATTRIBUTE
            .captures_iter(html)
            .map(|caps| caps[1].to_string())
            .collect(),
        LinkDiscovery::AnchorTextPrefix { prefix } => anchors_with_prefix(html, prefix)?,
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for candidate in candidates {
        let resolved = resolve_url(&base, &candidate)?;
        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }
    debug!("discovered {} document link(s) on {}", links.len(), base_url);
    Ok(links)
}

/// Text of the first element matching `selector`.
///
/// Tags named in `unwrap_tags` are merged into the text around them, the
/// first `skip_leading_nodes` child nodes of the fragment are ignored and the
/// remaining text nodes are joined with `'\n'`.
pub fn fragment_text(
    html: &str,
    selector: &str,
    unwrap_tags: &[String],
    skip_leading_nodes: usize,
) -> ParsingResult<String> {
    let parsed = Selector::parse(selector).map_err(|e| ParsingError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })?;
    let document = Html::parse_document(html);
    let fragment = document
        .select(&parsed)
        .next()
        .ok_or_else(|| ParsingError::FragmentNotFound {
            selector: selector.to_string(),
        })?;

    let mut collector = TextCollector::new(unwrap_tags);
    for child in fragment.children().skip(skip_leading_nodes) {
        match child.value() {
            Node::Text(text) => collector.current.push_str(text),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    collector.visit(element);
                }
            }
            _ => {}
        }
    }
    let text = collector.finish();
    if text.trim().is_empty() {
        return Err(ParsingError::EmptyDocument);
    }
    Ok(text)
}

fn anchors_with_prefix(html: &str, prefix: &str) -> ParsingResult<Vec<String>> {
    let selector = Selector::parse("a[href]").map_err(|e| ParsingError::InvalidSelector {
        selector: "a[href]".to_string(),
        reason: e.to_string(),
    })?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .filter(|a| a.text().any(|t| t.trim_start().starts_with(prefix)))
        .filter_map(|a| a.value().attr("href").map(str::to_string))
        .collect())
}

fn resolve_url(base: &Url, href: &str) -> ParsingResult<String> {
    base.join(href.trim())
        .map(|url| url.to_string())
        .map_err(|e| ParsingError::UrlResolutionFailed {
            url: href.to_string(),
            reason: e.to_string(),
            base_url: Some(base.to_string()),
        })
}

/// Accumulates text segments; a non-inline element boundary starts a new segment
struct TextCollector<'a> {
    unwrap_tags: &'a [String],
    segments: Vec<String>,
    current: String,
}

impl<'a> TextCollector<'a> {
    fn new(unwrap_tags: &'a [String]) -> Self {
        Self {
            unwrap_tags,
            segments: Vec::new(),
            current: String::new(),
        }
    }

    fn is_inline(&self, element: &ElementRef<'_>) -> bool {
        let name = element.value().name();
        self.unwrap_tags.iter().any(|t| t.eq_ignore_ascii_case(name))
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.segments.push(std::mem::take(&mut self.current));
        }
    }

    fn visit(&mut self, element: ElementRef<'_>) {
        let inline = self.is_inline(&element);
        if !inline {
            self.flush();
        }
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.current.push_str(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.visit(child);
                    }
                }
                _ => {}
            }
        }
        if !inline {
            self.flush();
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        self.segments.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.org/nos-menus/";

    #[test]
    fn test_pdf_links_resolved_and_deduplicated() {
        let html = r#"
            <a href="/wp-content/menu-32.PDF">Semaine 32</a>
            <a href="menu-33.pdf">Semaine 33</a>
            <a data-file="/wp-content/menu-32.PDF">Télécharger</a>
            <img src="logo.png">
        "#;
        let links = discover_links(html, BASE, &LinkDiscovery::PdfHrefPattern).unwrap();
        assert_eq!(
            links,
            vec![
                "https://example.org/wp-content/menu-32.PDF",
                "https://example.org/nos-menus/menu-33.pdf",
            ]
        );
    }

    #[test]
    fn test_anchor_text_prefix() {
        let html = r#"
            <a href="https://cdn.example.org/a.pdf">Menus semaine 32</a>
            <a href="/contact">Contact</a>
            <a href="/b.pdf"><span>Menus semaine 33</span></a>
            <a>Menus sans lien</a>
        "#;
        let discovery = LinkDiscovery::AnchorTextPrefix {
            prefix: "Menus".to_string(),
        };
        let links = discover_links(html, BASE, &discovery).unwrap();
        assert_eq!(
            links,
            vec!["https://cdn.example.org/a.pdf", "https://example.org/b.pdf"]
        );
    }

    #[test]
    fn test_listing_page_is_the_document() {
        let links = discover_links("", BASE, &LinkDiscovery::ListingPage).unwrap();
        assert_eq!(links, vec![BASE]);
    }

    #[test]
    fn test_invalid_base_url() {
        let err = discover_links("", "not a url", &LinkDiscovery::PdfHrefPattern).unwrap_err();
        assert!(matches!(err, ParsingError::UrlResolutionFailed { .. }));
    }

    #[test]
    fn test_fragment_text_unwraps_inline_tags() {
        let html = r#"<html><body>
            <div class="entry-content"><h1>Titre</h1><p>Nos menus du <strong>4</strong> au 8 août 2025</p><p>Lundi</p><p>Riz <amp-fit-text>cantonais</amp-fit-text></p></div>
            </body></html>"#;
        let unwrap = vec!["strong".to_string(), "amp-fit-text".to_string()];
        let text = fragment_text(html, ".entry-content", &unwrap, 1).unwrap();
        assert_eq!(text, "Nos menus du 4 au 8 août 2025\nLundi\nRiz cantonais");
    }

    #[test]
    fn test_fragment_without_unwrap_splits_on_tags() {
        let html = r#"<div id="m"><p>Riz <b>basmati</b></p></div>"#;
        let text = fragment_text(html, "#m", &[], 0).unwrap();
        assert_eq!(text, "Riz \nbasmati");
    }

    #[test]
    fn test_fragment_errors() {
        assert!(matches!(
            fragment_text("<p>x</p>", ".entry-content", &[], 0),
            Err(ParsingError::FragmentNotFound { .. })
        ));
        assert!(matches!(
            fragment_text("<p>x</p>", "p[", &[], 0),
            Err(ParsingError::InvalidSelector { .. })
        ));
        assert!(matches!(
            fragment_text("<div class='c'> </div>", ".c", &[], 0),
            Err(ParsingError::EmptyDocument)
        ));
    }
}
