use crate::attachment::read_image_data_url;
use crate::index::{build_index, IndexReport, SkippedPage};
use crate::responder::Responder;
use crate::traits::{MessageStore, PageSource};
use crate::{
    ChatError, Message, PageEntry, ReplyRules, ReplyTiming, Sender, SiteOptions, QUICK_REPLIES,
    WELCOME_MESSAGE,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Prompt used for the bot turn that follows an image upload.
pub const IMAGE_PROMPT: &str = "image";

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub site: SiteOptions,
    pub timing: ReplyTiming,
    pub rules: ReplyRules,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingBotReply,
}

/// Everything an index build needs, detached from the session so the build
/// can run without holding the session lock.
pub struct IndexJob<S: ?Sized> {
    source: Arc<S>,
    current_html: String,
    site: SiteOptions,
}

impl<S> IndexJob<S>
where
    S: PageSource + Send + Sync + ?Sized,
{
    pub async fn run(&self) -> IndexReport {
        build_index(self.source.as_ref(), &self.current_html, &self.site).await
    }
}

/// A user turn that still owes exactly one bot message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub prompt: String,
    pub delay: Duration,
}

pub struct ChatSession<S, M>
where
    S: PageSource,
    M: MessageStore,
{
    source: Arc<S>,
    store: M,
    config: SessionConfig,
    responder: Responder,
    current_html: String,
    messages: Vec<Message>,
    index: Vec<PageEntry>,
    skipped_pages: Vec<SkippedPage>,
    pending_replies: usize,
}

pub type SharedSession<S, M> = Arc<Mutex<ChatSession<S, M>>>;

impl<S, M> ChatSession<S, M>
where
    S: PageSource + Send + Sync,
    M: MessageStore + Send + Sync,
{
    pub fn new(
        source: S,
        store: M,
        current_html: impl Into<String>,
        config: SessionConfig,
    ) -> Result<Self, ChatError> {
        let responder = Responder::new(&config.rules)?;
        Ok(Self {
            source: Arc::new(source),
            store,
            config,
            responder,
            current_html: current_html.into(),
            messages: Vec::new(),
            index: Vec::new(),
            skipped_pages: Vec::new(),
            pending_replies: 0,
        })
    }

    /// Creates the session and loads its stored history.
    pub async fn open(
        source: S,
        store: M,
        current_html: impl Into<String>,
        config: SessionConfig,
    ) -> Result<Self, ChatError> {
        let mut session = Self::new(source, store, current_html, config)?;
        session.load().await?;
        Ok(session)
    }

    /// Replaces the in-memory log with the stored one; an empty history gets the welcome message.
    pub async fn load(&mut self) -> Result<(), ChatError> {
        self.messages = self.store.load(&self.config.site.storage_key).await;
        if self.messages.is_empty() {
            self.push(Message::text(Sender::Bot, WELCOME_MESSAGE)).await?;
        }
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn index(&self) -> &[PageEntry] {
        &self.index
    }

    pub fn skipped_pages(&self) -> &[SkippedPage] {
        &self.skipped_pages
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> TurnState {
        if self.pending_replies > 0 {
            TurnState::AwaitingBotReply
        } else {
            TurnState::Idle
        }
    }

    /// True while at least one turn is waiting for its bot message.
    pub fn is_typing(&self) -> bool {
        self.state() == TurnState::AwaitingBotReply
    }

    pub fn index_job(&self) -> IndexJob<S> {
        IndexJob {
            source: Arc::clone(&self.source),
            current_html: self.current_html.clone(),
            site: self.config.site.clone(),
        }
    }

    pub fn install_index(&mut self, report: IndexReport) {
        self.index = report.pages;
        self.skipped_pages = report.skipped_pages;
    }

    pub async fn rebuild_index(&mut self) {
        let report = self.index_job().run().await;
        self.install_index(report);
    }

    /// Builds the index only when it is empty. Returns whether a build ran.
    pub async fn ensure_index(&mut self) -> bool {
        if !self.index.is_empty() {
            return false;
        }
        self.rebuild_index().await;
        true
    }

    pub async fn submit_text(&mut self, text: &str) -> Result<Option<PendingReply>, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        self.push(Message::text(Sender::User, text)).await?;
        Ok(Some(self.open_turn(text)))
    }

    pub async fn submit_quick_reply(
        &mut self,
        position: usize,
    ) -> Result<Option<PendingReply>, ChatError> {
        let label = QUICK_REPLIES.get(position).ok_or_else(|| {
            ChatError::InvalidArgument(format!(
                "quick reply {position} does not exist (expected 0..{})",
                QUICK_REPLIES.len()
            ))
        })?;
        self.submit_text(label).await
    }

    pub async fn submit_image(&mut self, path: &Path) -> Result<PendingReply, ChatError> {
        let data_url = read_image_data_url(path).await?;
        self.push(Message::image(Sender::User, data_url)).await?;
        Ok(self.open_turn(IMAGE_PROMPT))
    }

    pub fn answer(&self, prompt: &str) -> String {
        self.responder.answer(&self.index, prompt)
    }

    /// Appends the bot message that closes one pending turn. The turn counts as
    /// closed even when persisting the reply fails.
    pub async fn deliver(&mut self, reply: String) -> Result<Message, ChatError> {
        self.pending_replies = self.pending_replies.saturating_sub(1);
        let message = Message::text(Sender::Bot, reply);
        self.push(message.clone()).await?;
        Ok(message)
    }

    /// Resolves a turn in place: index if needed, wait out the delay, then answer.
    pub async fn reply(&mut self, pending: PendingReply) -> Result<Message, ChatError> {
        self.ensure_index().await;
        tokio::time::sleep(pending.delay).await;
        let reply = self.answer(&pending.prompt);
        self.deliver(reply).await
    }

    /// Submits text and waits for its reply. `None` when the text was blank.
    pub async fn converse(&mut self, text: &str) -> Result<Option<Message>, ChatError> {
        match self.submit_text(text).await? {
            Some(pending) => Ok(Some(self.reply(pending).await?)),
            None => Ok(None),
        }
    }

    pub async fn clear_history(&mut self) -> Result<(), ChatError> {
        self.store.clear(&self.config.site.storage_key).await?;
        self.messages.clear();
        Ok(())
    }

    fn open_turn(&mut self, prompt: &str) -> PendingReply {
        self.pending_replies += 1;
        PendingReply {
            prompt: prompt.to_string(),
            delay: self.config.timing.delay_for(prompt),
        }
    }

    /// The in-memory log only takes the message once the store has it.
    async fn push(&mut self, message: Message) -> Result<(), ChatError> {
        let mut candidate = self.messages.clone();
        candidate.push(message);
        self.store
            .save(&self.config.site.storage_key, &candidate)
            .await?;
        self.messages = candidate;
        Ok(())
    }
}

/// Schedules the bot reply for `pending` on the runtime. The session is not
/// locked while the index builds or during the delay, so users can keep
/// sending and overlapping turns may complete out of order.
pub fn spawn_reply<S, M>(
    session: SharedSession<S, M>,
    pending: PendingReply,
) -> JoinHandle<Result<Message, ChatError>>
where
    S: PageSource + Send + Sync + 'static,
    M: MessageStore + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let job = {
            let guard = session.lock().await;
            let job = guard.index().is_empty().then(|| guard.index_job());
            job
        };
        if let Some(job) = job {
            let report = job.run().await;
            let mut guard = session.lock().await;
            if guard.index().is_empty() {
                guard.install_index(report);
            }
        }

        tokio::time::sleep(pending.delay).await;

        let mut guard = session.lock().await;
        let reply = guard.answer(&pending.prompt);
        guard.deliver(reply).await
    })
}
