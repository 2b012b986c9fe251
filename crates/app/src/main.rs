use chrono::Utc;
use clap::{Parser, Subcommand};
use site_chat_core::{
    spawn_reply, ChatSession, DirectoryPageSource, HttpPageSource, JsonFileStore, Message,
    MessageBody, MessageStore, PageSource, PendingReply, ReplyTiming, Sender, SessionConfig,
    SharedSession, SiteOptions, QUICK_REPLIES,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

type BoxedSource = Box<dyn PageSource + Send + Sync>;
type Session = ChatSession<BoxedSource, JsonFileStore>;

#[derive(Parser)]
#[command(name = "site-chat", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Folder that holds the site's HTML pages
    #[arg(long, env = "SITE_CHAT_ROOT", default_value = ".")]
    site_root: PathBuf,

    /// Fetch pages over HTTP from this base URL instead of the site folder
    #[arg(long, env = "SITE_CHAT_BASE_URL")]
    base_url: Option<String>,

    /// Folder used as local storage for the chat log
    #[arg(long, env = "SITE_CHAT_STORAGE_DIR", default_value = ".site-chat")]
    storage_dir: PathBuf,

    /// Page treated as the one currently loaded
    #[arg(long, env = "SITE_CHAT_CURRENT_PAGE", default_value = "index.html")]
    current_page: String,

    /// Label for the currently loaded page in replies and listings
    #[arg(long, default_value = "Kreu")]
    site_label: String,

    /// HTTP timeout per page fetch
    #[arg(long, default_value = "10")]
    timeout_secs: u64,

    /// Answer immediately instead of simulating typing
    #[arg(long, default_value_t = false)]
    no_delay: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat. Type messages, or /quick N, /attach PATH, /history, /quit.
    Chat,
    /// Send one message and print the assistant's reply.
    Ask {
        /// Message text
        #[arg(long)]
        query: String,
    },
    /// Build the site index and list what was indexed.
    Index,
    /// Print the stored chat history.
    History,
    /// Reset the stored chat history.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "site-chat boot"
    );

    let site = SiteOptions {
        site_label: cli.site_label.clone(),
        current_page: cli.current_page.clone(),
        ..SiteOptions::default()
    };
    let config = SessionConfig {
        site,
        timing: if cli.no_delay {
            ReplyTiming::INSTANT
        } else {
            ReplyTiming::default()
        },
        ..SessionConfig::default()
    };

    let source = open_source(&cli)?;
    let current_html = match source.fetch(&cli.current_page).await {
        Ok(html) => html,
        Err(error) => {
            warn!(
                page = %cli.current_page,
                reason = %error,
                "current page unavailable, indexing it as empty"
            );
            String::new()
        }
    };
    let store = JsonFileStore::new(&cli.storage_dir);

    match cli.command {
        Command::Chat => {
            let session = Session::open(source, store, current_html, config)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            run_chat(Arc::new(Mutex::new(session))).await?;
        }
        Command::Ask { query } => {
            let mut session = Session::open(source, store, current_html, config)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            let Some(pending) = session
                .submit_text(&query)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?
            else {
                println!("nothing to send: message is blank");
                return Ok(());
            };

            if session.ensure_index().await {
                log_index(&session);
            }
            let reply = session
                .reply(pending)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            println!("{}", render_message(&reply));
        }
        Command::Index => {
            let mut session = Session::new(source, store, current_html, config)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            session.rebuild_index().await;
            log_index(&session);

            for page in session.index() {
                println!(
                    "[{}] url={} tokens={} chars={}",
                    page.source,
                    page.url,
                    page.tokens.len(),
                    page.text.chars().count()
                );
            }
            for skipped in session.skipped_pages() {
                println!("skipped {}: {}", skipped.path, skipped.reason);
            }
        }
        Command::History => {
            let messages = store.load(&config.site.storage_key).await;
            if messages.is_empty() {
                println!("no stored messages");
            }
            for message in &messages {
                println!("{}", render_message(message));
            }
        }
        Command::Clear => {
            store
                .clear(&config.site.storage_key)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            println!(
                "cleared chat history at {}",
                store.path_for(&config.site.storage_key).display()
            );
        }
    }

    Ok(())
}

fn open_source(cli: &Cli) -> anyhow::Result<BoxedSource> {
    match &cli.base_url {
        Some(base_url) => {
            info!(base_url = %base_url, "fetching pages over http");
            let source =
                HttpPageSource::with_timeout(base_url, Duration::from_secs(cli.timeout_secs))
                    .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            Ok(Box::new(source))
        }
        None => {
            info!(site_root = %cli.site_root.display(), "reading pages from folder");
            Ok(Box::new(DirectoryPageSource::new(&cli.site_root)))
        }
    }
}

fn log_index(session: &Session) {
    info!(page_count = session.index().len(), "site index built");
    for skipped in session.skipped_pages() {
        warn!(path = %skipped.path, reason = %skipped.reason, "skipped page");
    }
}

async fn run_chat(session: SharedSession<BoxedSource, JsonFileStore>) -> anyhow::Result<()> {
    {
        let session = session.lock().await;
        for message in session.messages() {
            println!("{}", render_message(message));
        }
    }
    print_quick_replies();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut replies: Vec<JoinHandle<()>> = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let submitted = if line == "/quit" {
            break;
        } else if line == "/history" {
            let session = session.lock().await;
            for message in session.messages() {
                println!("{}", render_message(message));
            }
            continue;
        } else if let Some(position) = line.strip_prefix("/quick") {
            match position.trim().parse::<usize>() {
                Ok(position) if position >= 1 => {
                    session.lock().await.submit_quick_reply(position - 1).await
                }
                _ => {
                    print_quick_replies();
                    continue;
                }
            }
        } else if let Some(path) = line.strip_prefix("/attach") {
            session
                .lock()
                .await
                .submit_image(Path::new(path.trim()))
                .await
                .map(Some)
        } else {
            session.lock().await.submit_text(line).await
        };

        match submitted {
            Ok(Some(pending)) => {
                println!("... typing");
                replies.push(schedule_reply(session.clone(), pending));
            }
            Ok(None) => {}
            Err(error) => warn!(reason = %error, "message not sent"),
        }
    }

    for handle in replies {
        if let Err(error) = handle.await {
            warn!(reason = %error, "reply task failed");
        }
    }

    Ok(())
}

fn schedule_reply(
    session: SharedSession<BoxedSource, JsonFileStore>,
    pending: PendingReply,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(
            prompt = %pending.prompt,
            delay_ms = pending.delay.as_millis() as u64,
            "reply scheduled"
        );
        match spawn_reply(session, pending).await {
            Ok(Ok(message)) => println!("{}", render_message(&message)),
            Ok(Err(error)) => warn!(reason = %error, "reply could not be stored"),
            Err(error) => warn!(reason = %error, "reply task panicked"),
        }
    })
}

fn print_quick_replies() {
    let labels = QUICK_REPLIES
        .iter()
        .enumerate()
        .map(|(position, label)| format!("/quick {} = {label}", position + 1))
        .collect::<Vec<_>>();
    println!("quick replies: {}", labels.join(", "));
}

fn render_message(message: &Message) -> String {
    let time = message
        .sent_at
        .map(|sent_at| sent_at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    let from = match message.from {
        Sender::User => "you",
        Sender::Bot => "bot",
    };

    match &message.body {
        MessageBody::Text { text } => format!("{time} [{from}] {text}"),
        MessageBody::Image { src } => format!("{time} [{from}] <image, {} chars>", src.len()),
    }
}
