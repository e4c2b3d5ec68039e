use std::collections::HashSet;
use std::path::Path;

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::document::Document;
use crate::error::{RagError, Result};

/// CSS classes kept from a web page when no other filter is given.
pub const DEFAULT_CONTENT_CLASSES: &[&str] = &["post-content", "post-title", "post-header"];

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Which parts of a fetched page become document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentFilter {
    /// Elements carrying any of these CSS classes.
    Classes(Vec<String>),
    /// Elements matching a CSS selector.
    Selector(String),
    /// Every visible text node on the page.
    All,
}

impl Default for ContentFilter {
    fn default() -> Self {
        ContentFilter::Classes(DEFAULT_CONTENT_CLASSES.iter().map(|c| c.to_string()).collect())
    }
}

impl ContentFilter {
    fn selector(&self) -> Result<Option<Selector>> {
        let css = match self {
            ContentFilter::All => return Ok(None),
            ContentFilter::Selector(css) => css.clone(),
            ContentFilter::Classes(classes) => classes
                .iter()
                .map(|c| format!(".{}", c.trim_start_matches('.')))
                .collect::<Vec<_>>()
                .join(", "),
        };
        Selector::parse(&css)
            .map(Some)
            .map_err(|e| RagError::InvalidConfig(format!("Invalid content selector '{}': {:?}", css, e)))
    }
}

/// Reads a UTF-8 text file into a single document.
pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RagError::io(path, e))?;
    log::info!("Loaded {} ({} chars)", path.display(), content.chars().count());
    Ok(vec![Document::new(content, path.display().to_string())])
}

/// Fetches every URL in order and extracts its content.
///
/// Fail-fast: the first URL that cannot be parsed, fetched or read aborts the
/// whole call and nothing is returned.
pub async fn load_from_web(
    client: &reqwest::Client,
    urls: &[String],
    filter: &ContentFilter,
) -> Result<Vec<Document>> {
    let mut documents = Vec::with_capacity(urls.len());
    for raw in urls {
        let url = Url::parse(raw.trim()).map_err(|e| RagError::fetch(raw.as_str(), e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RagError::fetch(raw.as_str(), format!("unsupported scheme '{}'", url.scheme())));
        }

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| RagError::fetch(raw.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RagError::fetch(raw.as_str(), format!("HTTP status {}", status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| RagError::fetch(raw.as_str(), e))?;

        let mut document = extract_content(&html, filter)?;
        // Cite the URL as the user typed it, not the normalised form
        document.metadata.insert("source".to_string(), raw.trim().to_string());
        if document.content.trim().is_empty() {
            log::warn!("No content matched the filter on {}", url);
        }
        log::info!("Fetched {} ({} chars)", url, document.content.chars().count());
        documents.push(document);
    }
    Ok(documents)
}

/// Extracts filtered text, plus `title` and `language` metadata when present.
/// The `source` key is left for the caller to fill in.
pub fn extract_content(html: &str, filter: &ContentFilter) -> Result<Document> {
    let page = Html::parse_document(html);

    let content = match filter.selector()? {
        None => visible_text(page.root_element()),
        Some(selector) => {
            let mut seen = HashSet::new();
            let mut parts = Vec::new();
            for element in page.select(&selector) {
                let nested = element.ancestors().any(|a| seen.contains(&a.id()));
                seen.insert(element.id());
                if nested {
                    continue;
                }
                let text = visible_text(element);
                if !text.trim().is_empty() {
                    parts.push(text);
                }
            }
            parts.join("\n")
        }
    };

    let mut document = Document {
        content,
        metadata: Default::default(),
    };

    if let Ok(title_selector) = Selector::parse("title") {
        if let Some(title) = page.select(&title_selector).next() {
            let title = title.text().collect::<String>().trim().to_string();
            if !title.is_empty() {
                document.metadata.insert("title".to_string(), title);
            }
        }
    }
    if let Some(lang) = page.root_element().value().attr("lang") {
        document.metadata.insert("language".to_string(), lang.to_string());
    }

    Ok(document)
}

fn visible_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        if let Node::Text(fragment) = node.value() {
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element())
                .map_or(false, |e| SKIPPED_TAGS.contains(&e.name()));
            if !hidden {
                text.push_str(fragment);
            }
        }
    }
    text
}
