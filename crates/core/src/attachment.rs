use crate::ChatError;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::Path;

pub fn image_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Reads a local image as an embeddable `data:` URL.
pub async fn read_image_data_url(path: &Path) -> Result<String, ChatError> {
    let mime = image_mime_type(path).ok_or_else(|| {
        ChatError::UnsupportedAttachment(format!("not an image file: {}", path.display()))
    })?;
    let bytes = tokio::fs::read(path).await?;
    Ok(encode_data_url(mime, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(image_mime_type(Path::new("a/photo.JPG")), Some("image/jpeg"));
        assert_eq!(image_mime_type(Path::new("logo.svg")), Some("image/svg+xml"));
        assert_eq!(image_mime_type(Path::new("notes.txt")), None);
        assert_eq!(image_mime_type(Path::new("README")), None);
    }

    #[tokio::test]
    async fn image_is_read_as_data_url() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let image = dir.path().join("dot.png");
        std::fs::write(&image, b"abc")?;

        assert_eq!(read_image_data_url(&image).await?, "data:image/png;base64,YWJj");

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"abc")?;
        assert!(matches!(
            read_image_data_url(&text).await,
            Err(ChatError::UnsupportedAttachment(_))
        ));
        Ok(())
    }
}
