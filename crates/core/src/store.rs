use crate::traits::MessageStore;
use crate::{ChatError, Message};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Keeps each storage key as `<dir>/<key>.json`.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl MessageStore for JsonFileStore {
    async fn load(&self, key: &str) -> Vec<Message> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => parse_messages(&bytes),
            Err(_) => Vec::new(),
        }
    }

    async fn save(&self, key: &str, messages: &[Message]) -> Result<(), ChatError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let payload = serde_json::to_vec(messages)?;
        write_replacing(&self.path_for(key), &payload).await
    }

    async fn clear(&self, key: &str) -> Result<(), ChatError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

async fn write_replacing(path: &Path, payload: &[u8]) -> Result<(), ChatError> {
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, payload).await?;
    tokio::fs::rename(&staging, path).await?;
    Ok(())
}

/// `null`, malformed JSON or a non-array value all read as no history.
fn parse_messages(bytes: &[u8]) -> Vec<Message> {
    serde_json::from_slice::<Option<Vec<Message>>>(bytes)
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn set_raw(&self, key: &str, value: impl Into<String>) {
        self.entries.lock().await.insert(key.to_string(), value.into());
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn load(&self, key: &str) -> Vec<Message> {
        self.raw(key)
            .await
            .map(|value| parse_messages(value.as_bytes()))
            .unwrap_or_default()
    }

    async fn save(&self, key: &str, messages: &[Message]) -> Result<(), ChatError> {
        let value = serde_json::to_string(messages)?;
        self.set_raw(key, value).await;
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), ChatError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sender;
    use tempfile::tempdir;

    const KEY: &str = "puna_chat_messages_v1";

    fn sample_messages() -> Vec<Message> {
        vec![
            Message::text(Sender::Bot, "Përshëndetje!"),
            Message::text(Sender::User, "Çmimet"),
            Message::image(Sender::User, "data:image/png;base64,iVBORw0KGgo="),
            Message::text(Sender::Bot, "Shërbimet fillojnë nga 80€"),
        ]
    }

    #[tokio::test]
    async fn file_store_round_trips_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().join("storage"));
        let messages = sample_messages();

        store.save(KEY, &messages).await?;
        let reloaded = JsonFileStore::new(dir.path().join("storage")).load(KEY).await;
        assert_eq!(reloaded, messages);
        Ok(())
    }

    #[tokio::test]
    async fn missing_or_malformed_storage_is_empty() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path());
        assert!(store.load(KEY).await.is_empty());

        std::fs::write(store.path_for(KEY), b"{not json")?;
        assert!(store.load(KEY).await.is_empty());

        std::fs::write(store.path_for(KEY), b"null")?;
        assert!(store.load(KEY).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn clear_removes_history_and_tolerates_missing_keys(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path());
        store.clear(KEY).await?;

        store.save(KEY, &sample_messages()).await?;
        store.clear(KEY).await?;
        assert!(store.load(KEY).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn memory_store_reads_widget_format() {
        let store = MemoryStore::default();
        store
            .set_raw(KEY, r#"[{"type":"text","text":"hi","from":"user"}]"#)
            .await;

        let messages = store.load(KEY).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].as_text(), Some("hi"));

        store.set_raw(KEY, "[{\"from\":").await;
        assert!(store.load(KEY).await.is_empty());
    }
}
