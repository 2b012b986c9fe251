use crate::error::FetchError;
use scraper::{Html, Selector};

/// Structural elements whose text counts as visible page content.
pub const TEXT_SELECTOR: &str = "h1,h2,h3,h4,p,li,span";

pub trait TextExtractor {
    fn extract_text(&self, html: &str) -> Result<String, FetchError>;
}

#[derive(Debug, Clone)]
pub struct StructuralTextExtractor {
    pub selector: String,
}

impl Default for StructuralTextExtractor {
    fn default() -> Self {
        Self {
            selector: TEXT_SELECTOR.to_string(),
        }
    }
}

impl TextExtractor for StructuralTextExtractor {
    fn extract_text(&self, html: &str) -> Result<String, FetchError> {
        let selector = Selector::parse(&self.selector)
            .map_err(|error| FetchError::Parse(format!("{}: {error}", self.selector)))?;
        let document = Html::parse_document(html);

        let parts = document
            .select(&selector)
            .map(|element| element.text().collect::<String>())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>();

        Ok(parts.join("\n"))
    }
}

pub fn extract_visible_text(html: &str) -> Result<String, FetchError> {
    StructuralTextExtractor::default().extract_text(html)
}
