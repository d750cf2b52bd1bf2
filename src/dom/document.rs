use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Snapshot of a page's DOM taken once its ready condition held.
///
/// The markup is kept as a string and parsed on demand: `scraper::Html` is
/// not `Send`, and documents cross await points in the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub url: String,
    pub html: String,
    pub captured_at: DateTime<Utc>,
}

impl RenderedDocument {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            captured_at: Utc::now(),
        }
    }

    pub fn parse(&self) -> Html {
        Html::parse_document(&self.html)
    }

    /// Text of every element matching `selector`, in document order.
    pub fn texts(&self, selector: &Selector) -> Vec<String> {
        texts_in(&self.parse(), selector)
    }
}

pub(crate) fn texts_in(html: &Html, selector: &Selector) -> Vec<String> {
    html.select(selector)
        .map(|element| normalize_text(&element.text().collect::<Vec<_>>().join(" ")))
        .collect()
}

/// Collapse runs of whitespace and trim, approximating the browser's rendered text.
pub fn normalize_text(raw: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    re.replace_all(raw.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Half\n   True \t"), "Half True");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("50%"), "50%");
    }

    #[test]
    fn test_texts_in_document_order() {
        let doc = RenderedDocument::new(
            "https://example.com/alice",
            r#"<html><body>
                <ul><li class="x">first</li><li class="y">skip</li><li class="x">
                    second <b>part</b></li></ul>
            </body></html>"#,
        );
        let selector = Selector::parse(".x").unwrap();
        assert_eq!(doc.texts(&selector), vec!["first", "second part"]);
    }
}
