use crate::extractor::{StructuralTextExtractor, TextExtractor};
use crate::traits::PageSource;
use crate::{FetchError, PageEntry, SiteOptions};

#[derive(Debug, Clone)]
pub struct SkippedPage {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct IndexReport {
    pub pages: Vec<PageEntry>,
    pub skipped_pages: Vec<SkippedPage>,
}

/// Page label derived from its path, e.g. `projects.html` -> `projects`.
pub fn page_label(path: &str) -> String {
    path.replacen(".html", "", 1)
}

/// Indexes the loaded page first, then every other known page the source can serve.
pub async fn build_index<S>(
    source: &S,
    current_html: &str,
    options: &SiteOptions,
) -> IndexReport
where
    S: PageSource + Sync + ?Sized,
{
    let extractor = StructuralTextExtractor::default();
    let mut pages = Vec::new();
    let mut skipped_pages = Vec::new();

    match extractor.extract_text(current_html) {
        Ok(text) => pages.push(PageEntry::new(
            options.site_label.clone(),
            options.current_page.clone(),
            text,
        )),
        Err(error) => skipped_pages.push(SkippedPage {
            path: options.current_page.clone(),
            reason: error.to_string(),
        }),
    }

    for path in &options.pages {
        if *path == options.current_page {
            continue;
        }

        match index_page(source, &extractor, path).await {
            Ok(entry) => pages.push(entry),
            Err(error) => skipped_pages.push(SkippedPage {
                path: path.clone(),
                reason: error.to_string(),
            }),
        }
    }

    IndexReport {
        pages,
        skipped_pages,
    }
}

async fn index_page<S>(
    source: &S,
    extractor: &StructuralTextExtractor,
    path: &str,
) -> Result<PageEntry, FetchError>
where
    S: PageSource + Sync + ?Sized,
{
    let html = source.fetch(path).await?;
    let text = extractor.extract_text(&html)?;
    Ok(PageEntry::new(page_label(path), path, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakePageSource {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageSource for FakePageSource {
        async fn fetch(&self, path: &str) -> Result<String, FetchError> {
            self.pages
                .get(path)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    path: path.to_string(),
                    status: 404,
                })
        }
    }

    #[test]
    fn labels_drop_the_html_extension() {
        assert_eq!(page_label("projects.html"), "projects");
        assert_eq!(page_label("notes.txt"), "notes.txt");
    }

    #[tokio::test]
    async fn current_page_comes_first_and_failures_are_skipped() {
        let mut source = FakePageSource::default();
        source
            .pages
            .insert("about.html".to_string(), "<h2>About me</h2>".to_string());
        source.pages.insert(
            "contact.html".to_string(),
            "<p>Write to me.</p><li>Tirana</li>".to_string(),
        );

        let report = build_index(&source, "<h1>Olti</h1>", &SiteOptions::default()).await;

        let urls = report
            .pages
            .iter()
            .map(|page| page.url.as_str())
            .collect::<Vec<_>>();
        assert_eq!(urls, vec!["index.html", "about.html", "contact.html"]);
        assert_eq!(report.pages[0].source, "Kreu");
        assert_eq!(report.pages[1].source, "about");
        assert_eq!(report.pages[2].text, "Write to me.\nTirana");
        assert_eq!(report.pages[2].tokens, vec!["write", "to", "me", "tirana"]);

        assert_eq!(report.skipped_pages.len(), 1);
        assert_eq!(report.skipped_pages[0].path, "projects.html");
    }

    #[tokio::test]
    async fn unreachable_site_still_indexes_the_loaded_page() {
        let source = FakePageSource::default();
        let report = build_index(&source, "<p>Only here</p>", &SiteOptions::default()).await;

        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.pages[0].text, "Only here");
        assert_eq!(report.skipped_pages.len(), 3);
    }
}
