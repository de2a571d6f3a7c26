//! Store selection and command execution.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chat::{ChatService, InboxWatch, StoreProfileDirectory};
use chat_core::{InboxEntry, UserProfile};
use docstore_core::DocumentStore;
use docstore_inmemory::InMemoryDocumentStore;
use docstore_sqlite::SqliteDocumentStore;
use tracing::info;

use crate::cli::Commands;
use crate::config::{AppConfig, StoreType};

/// Opens the configured document store.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>> {
    info!(store_type = %config.store_type, "Opening document store");
    let store: Arc<dyn DocumentStore> = match config.store_type {
        StoreType::Sqlite => Arc::new(
            SqliteDocumentStore::new(&config.database_url)
                .await
                .with_context(|| format!("Open SQLite store at {}", config.database_url))?,
        ),
        StoreType::Memory => Arc::new(InMemoryDocumentStore::new()),
    };
    Ok(store)
}

/// Runs one command against the service, writing human-readable output to `out`.
pub async fn run_command<W: Write>(
    store: Arc<dyn DocumentStore>,
    service: &ChatService,
    command: Commands,
    out: &mut W,
) -> Result<()> {
    match command {
        Commands::Profile {
            user_id,
            display_name,
            avatar_url,
        } => {
            let profile = UserProfile {
                user_id,
                display_name,
                avatar_url,
            };
            StoreProfileDirectory::new(store)
                .put_profile(&profile)
                .await
                .context("Save profile")?;
            writeln!(out, "Saved profile {}", profile.user_id)?;
        }
        Commands::Open {
            user_a,
            user_b,
            listing,
        } => {
            let thread_id = service
                .get_or_create_thread(&user_a, &user_b, listing.as_deref())
                .await
                .context("Open thread")?;
            writeln!(out, "{}", thread_id)?;
        }
        Commands::Send {
            thread_id,
            sender_id,
            text,
        } => {
            let message_id = service
                .append_message(&thread_id, &sender_id, &text)
                .await
                .context("Send message")?;
            writeln!(out, "{}", message_id)?;
        }
        Commands::Read { thread_id, user_id } => {
            service
                .mark_read(&thread_id, &user_id)
                .await
                .context("Mark thread read")?;
            writeln!(out, "Marked {} read for {}", thread_id, user_id)?;
        }
        Commands::Unread {
            user_id,
            thread,
            recount,
        } => {
            let count = match thread {
                Some(thread_id) if recount => service.recount_unread(&thread_id, &user_id).await,
                Some(thread_id) => service.get_unread_count(&thread_id, &user_id).await,
                None => service.total_unread(&user_id).await,
            }
            .context("Read unread count")?;
            writeln!(out, "{}", count)?;
        }
        Commands::Messages {
            thread_id,
            user_id,
            limit,
        } => {
            let messages = service
                .list_messages(&thread_id, &user_id, limit)
                .await
                .context("List messages")?;
            for m in messages {
                writeln!(
                    out,
                    "[{}] {}: {}",
                    m.created_at.format("%Y-%m-%d %H:%M:%S"),
                    m.sender_id,
                    m.text
                )?;
            }
        }
        Commands::Inbox {
            user_id,
            watch: false,
            ..
        } => {
            let inbox = service
                .list_inbox_for_user(&user_id)
                .await
                .context("List inbox")?;
            write_inbox(out, &inbox)?;
        }
        Commands::Inbox {
            user_id,
            watch: true,
            interval,
        } => {
            // Polling only: change feeds do not cross processes.
            let watch = match interval {
                Some(secs) => service.poll_inbox(&user_id, Duration::from_secs(secs)),
                None => service.watch_inbox(&user_id),
            };
            follow_inbox(watch, out).await?;
        }
    }
    Ok(())
}

/// Prints snapshots until Ctrl-C, then stops the watch.
async fn follow_inbox<W: Write>(mut watch: InboxWatch, out: &mut W) -> Result<()> {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            snapshot = watch.next() => match snapshot {
                Some(Ok(inbox)) => {
                    write_inbox(out, &inbox)?;
                    writeln!(out, "---")?;
                    out.flush()?;
                }
                Some(Err(e)) => tracing::warn!(error = %e, "Inbox refresh failed"),
                None => break,
            },
        }
    }
    watch.stop().await;
    Ok(())
}

fn write_inbox<W: Write>(out: &mut W, inbox: &[InboxEntry]) -> Result<()> {
    if inbox.is_empty() {
        writeln!(out, "(no conversations)")?;
    }
    for entry in inbox {
        writeln!(out, "{}", format_entry(entry))?;
    }
    Ok(())
}

/// One inbox line: thread, counterpart, unread badge and preview.
pub fn format_entry(entry: &InboxEntry) -> String {
    let listing = entry.thread.listing_id.as_deref().unwrap_or("-");
    let preview = entry
        .last_message()
        .map(|m| format!("{}: {}", m.sender_id, m.text))
        .unwrap_or_else(|| "(no messages)".to_string());
    format!(
        "{} [{}] {} ({} unread) {}",
        entry.thread.id, listing, entry.counterpart.display_name, entry.unread_count, preview
    )
}
