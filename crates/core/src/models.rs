use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Visible text of one site page plus its normalized tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub source: String,
    pub url: String,
    pub text: String,
    pub tokens: Vec<String>,
}

impl PageEntry {
    pub fn new(source: impl Into<String>, url: impl Into<String>, text: String) -> Self {
        let tokens = crate::tokens::tokenize(&text);
        Self {
            source: source.into(),
            url: url.into(),
            text,
            tokens,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBody {
    Text { text: String },
    Image { src: String },
}

/// One chat log entry. Serializes flat, e.g. `{"from":"bot","type":"text","text":"..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub from: Sender,
    #[serde(flatten)]
    pub body: MessageBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn text(from: Sender, text: impl Into<String>) -> Self {
        Self {
            from,
            body: MessageBody::Text { text: text.into() },
            sent_at: Some(Utc::now()),
        }
    }

    pub fn image(from: Sender, src: impl Into<String>) -> Self {
        Self {
            from,
            body: MessageBody::Image { src: src.into() },
            sent_at: Some(Utc::now()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text { text } => Some(text),
            MessageBody::Image { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub page: PageEntry,
    pub snippet: String,
    pub score: usize,
}

#[derive(Debug, Clone)]
pub struct SiteOptions {
    pub site_label: String,
    pub current_page: String,
    pub pages: Vec<String>,
    pub storage_key: String,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            site_label: "Kreu".to_string(),
            current_page: "index.html".to_string(),
            pages: ["index.html", "about.html", "projects.html", "contact.html"]
                .iter()
                .map(|page| page.to_string())
                .collect(),
            storage_key: "puna_chat_messages_v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReplyTiming {
    pub base_ms: u64,
    pub per_char_ms: u64,
    pub max_extra_ms: u64,
}

impl ReplyTiming {
    pub const INSTANT: Self = Self {
        base_ms: 0,
        per_char_ms: 0,
        max_extra_ms: 0,
    };

    pub fn delay_for(&self, text: &str) -> Duration {
        let chars = text.chars().count() as u64;
        let extra = chars.saturating_mul(self.per_char_ms).min(self.max_extra_ms);
        Duration::from_millis(self.base_ms.saturating_add(extra))
    }
}

impl Default for ReplyTiming {
    fn default() -> Self {
        Self {
            base_ms: 600,
            per_char_ms: 15,
            max_extra_ms: 1_200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplyRules {
    pub clarification: &'static str,
    pub fallback: &'static str,
    /// Checked in order; first matching pattern wins.
    pub topics: Vec<(&'static str, &'static str)>,
}

impl Default for ReplyRules {
    fn default() -> Self {
        Self {
            clarification: "Mund ta shpjegoni pak më shumë?",
            fallback: "Faleminderit për mesazhin! Do ta shqyrtoj dhe do të përgjigjem së shpejti.",
            topics: vec![
                (
                    r"(?i)price|çmim|sa|kost",
                    "Shërbimet fillojnë nga 80€ — shkruaj \"Çmimet\" për më shumë detaje.",
                ),
                (
                    r"(?i)hello|hi|pershendetje|hej",
                    "Përshëndetje! Si mund të ju ndihmoj sot?",
                ),
                (
                    r"(?i)portfolio|projek",
                    "Mund të shikoni portofolin te seksioni \"Projektet\" në sit.",
                ),
                (
                    r"(?i)kontakt|kontaktimi|kontaktoj",
                    "Mund të më shkruani këtu ose të përdorni formularin në Kontakt.",
                ),
            ],
        }
    }
}

pub const WELCOME_MESSAGE: &str = "Përshëndetje! Unë jam Olti Assistant. Si mund t'ju ndihmoj?";

pub const QUICK_REPLIES: [&str; 3] = ["Çmimet", "Projektet", "Kontakt"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_json_matches_widget_shape() {
        let message = Message {
            from: Sender::User,
            body: MessageBody::Text {
                text: "Çmimet".to_string(),
            },
            sent_at: None,
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"from": "user", "type": "text", "text": "Çmimet"})
        );

        let image: Message =
            serde_json::from_str(r#"{"type":"image","src":"data:image/png;base64,AA==","from":"user"}"#)
                .unwrap();
        assert_eq!(image.from, Sender::User);
        assert_eq!(
            image.body,
            MessageBody::Image {
                src: "data:image/png;base64,AA==".to_string()
            }
        );
        assert!(image.sent_at.is_none());
    }

    #[test]
    fn welcome_message_is_a_single_line() {
        assert!(!WELCOME_MESSAGE.contains('\n'));
        assert!(WELCOME_MESSAGE.ends_with("Si mund t'ju ndihmoj?"));
    }

    #[test]
    fn reply_delay_is_bounded() {
        let timing = ReplyTiming::default();
        assert_eq!(timing.delay_for(""), Duration::from_millis(600));
        assert_eq!(timing.delay_for("hello"), Duration::from_millis(675));
        assert_eq!(timing.delay_for(&"x".repeat(500)), Duration::from_millis(1_800));
        assert_eq!(ReplyTiming::INSTANT.delay_for("anything"), Duration::ZERO);
    }
}
