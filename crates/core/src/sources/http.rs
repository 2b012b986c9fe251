use crate::traits::PageSource;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub struct HttpPageSource {
    client: Arc<Client>,
    base_url: Url,
}

impl HttpPageSource {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, client)
    }

    pub fn with_client(base_url: &str, client: Client) -> Result<Self, FetchError> {
        Ok(Self {
            client: Arc::new(client),
            base_url: directory_url(base_url)?,
        })
    }

    pub fn page_url(&self, path: &str) -> Result<Url, FetchError> {
        Ok(self.base_url.join(path)?)
    }
}

/// Relative page paths resolve against the base as a directory.
fn directory_url(base_url: &str) -> Result<Url, FetchError> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let url = self.page_url(path)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
