pub mod attachment;
pub mod error;
pub mod extractor;
pub mod index;
pub mod models;
pub mod responder;
pub mod session;
pub mod sources;
pub mod store;
pub mod tokens;
pub mod traits;

pub use attachment::{encode_data_url, image_mime_type, read_image_data_url};
pub use error::{ChatError, FetchError};
pub use extractor::{extract_visible_text, StructuralTextExtractor, TextExtractor, TEXT_SELECTOR};
pub use index::{build_index, page_label, IndexReport, SkippedPage};
pub use models::{
    Message, MessageBody, PageEntry, ReplyRules, ReplyTiming, SearchResult, Sender, SiteOptions,
    QUICK_REPLIES, WELCOME_MESSAGE,
};
pub use responder::{compose_reply, search, Responder};
pub use session::{
    spawn_reply, ChatSession, IndexJob, PendingReply, SessionConfig, SharedSession, TurnState,
    IMAGE_PROMPT,
};
pub use sources::{DirectoryPageSource, HttpPageSource};
pub use store::{JsonFileStore, MemoryStore};
pub use tokens::{containment_score, split_sentences, tokenize};
pub use traits::{MessageStore, PageSource};
