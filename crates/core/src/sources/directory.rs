use crate::traits::PageSource;
use crate::FetchError;
use async_trait::async_trait;
use std::path::PathBuf;

/// Serves pages from a local site root, for sites opened without a web server.
pub struct DirectoryPageSource {
    root: PathBuf,
}

impl DirectoryPageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl PageSource for DirectoryPageSource {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let full_path = self.root.join(path.trim_start_matches('/'));
        Ok(tokio::fs::read_to_string(full_path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn reads_pages_relative_to_root() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("about.html"), "<p>About</p>")?;

        let source = DirectoryPageSource::new(dir.path());
        assert_eq!(source.fetch("about.html").await?, "<p>About</p>");
        assert_eq!(source.fetch("/about.html").await?, "<p>About</p>");
        assert!(matches!(
            source.fetch("missing.html").await,
            Err(FetchError::Io(_))
        ));
        Ok(())
    }
}
