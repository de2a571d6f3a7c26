//! CLI parser.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "marketchat")]
#[command(about = "Marketplace chat CLI: threads, messages, unread counts and inbox", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Store backend, overrides STORE_TYPE (sqlite | memory).
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// SQLite database path or URL, overrides DATABASE_URL.
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or replace a user's profile.
    Profile {
        user_id: String,
        display_name: String,
        #[arg(long)]
        avatar_url: Option<String>,
    },
    /// Open (or find) the thread between two users, optionally about a listing.
    Open {
        user_a: String,
        user_b: String,
        #[arg(short, long)]
        listing: Option<String>,
    },
    /// Send a message to a thread.
    Send {
        thread_id: String,
        sender_id: String,
        text: String,
    },
    /// Mark a thread read for a user.
    Read { thread_id: String, user_id: String },
    /// Show unread counts: one thread, or the user's total.
    Unread {
        user_id: String,
        #[arg(short, long)]
        thread: Option<String>,
        /// Recompute the thread's counter from the message log first.
        #[arg(long, requires = "thread")]
        recount: bool,
    },
    /// List the newest messages of a thread.
    Messages {
        thread_id: String,
        user_id: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show a user's inbox; with --watch keep refreshing until Ctrl-C.
    Inbox {
        user_id: String,
        #[arg(short, long)]
        watch: bool,
        /// Polling interval in seconds, overrides INBOX_POLL_INTERVAL_SECS.
        #[arg(long, requires = "watch", value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },
}
