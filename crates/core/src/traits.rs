use crate::{ChatError, FetchError, Message};
use async_trait::async_trait;

/// Fetch-like access to the site's pages by relative path.
#[async_trait]
pub trait PageSource {
    async fn fetch(&self, path: &str) -> Result<String, FetchError>;
}

/// Key/value persistence for the chat log, the equivalent of browser local storage.
#[async_trait]
pub trait MessageStore {
    /// Missing or malformed data loads as an empty history.
    async fn load(&self, key: &str) -> Vec<Message>;

    async fn save(&self, key: &str, messages: &[Message]) -> Result<(), ChatError>;

    async fn clear(&self, key: &str) -> Result<(), ChatError>;
}

#[async_trait]
impl<T> PageSource for Box<T>
where
    T: PageSource + Send + Sync + ?Sized,
{
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        (**self).fetch(path).await
    }
}
