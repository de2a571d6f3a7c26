//! Application config, loaded from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use chat::ChatConfig;

/// Which document store backs the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Sqlite,
    Memory,
}

impl FromStr for StoreType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreType::Sqlite),
            "memory" => Ok(StoreType::Memory),
            other => anyhow::bail!("Unknown store type '{}', expected sqlite or memory", other),
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreType::Sqlite => write!(f, "sqlite"),
            StoreType::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// STORE_TYPE
    pub store_type: StoreType,
    /// DATABASE_URL: SQLite file path or `sqlite:` URL
    pub database_url: String,
    /// LOG_FILE
    pub log_file: String,
    /// INBOX_POLL_INTERVAL_SECS
    pub inbox_poll_interval_secs: u64,
    /// CHAT_MAX_MESSAGE_LEN, in characters
    pub max_message_len: usize,
}

impl AppConfig {
    /// Load from environment variables. `store` and `database_url` override
    /// STORE_TYPE and DATABASE_URL when provided.
    pub fn load(store: Option<String>, database_url: Option<String>) -> Result<Self> {
        let store_type = store
            .or_else(|| env::var("STORE_TYPE").ok())
            .unwrap_or_else(|| "sqlite".to_string())
            .parse()?;
        let database_url = database_url
            .or_else(|| env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| "./marketchat.db".to_string());
        let log_file =
            env::var("LOG_FILE").unwrap_or_else(|_| "logs/marketchat.log".to_string());
        let inbox_poll_interval_secs = env::var("INBOX_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);
        let max_message_len = env::var("CHAT_MAX_MESSAGE_LEN")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(chat::DEFAULT_MAX_MESSAGE_LEN);

        Ok(Self {
            store_type,
            database_url,
            log_file,
            inbox_poll_interval_secs,
            max_message_len,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.inbox_poll_interval_secs == 0 {
            anyhow::bail!("INBOX_POLL_INTERVAL_SECS must be greater than 0");
        }
        if self.max_message_len == 0 {
            anyhow::bail!("CHAT_MAX_MESSAGE_LEN must be greater than 0");
        }
        if self.store_type == StoreType::Sqlite && self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL must be set when STORE_TYPE=sqlite");
        }
        Ok(())
    }

    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            max_message_len: self.max_message_len,
            inbox_poll_interval: Duration::from_secs(self.inbox_poll_interval_secs),
        }
    }
}
