use std::path::PathBuf;
use std::time::Duration;

use crate::dispatch::access::AccessSettings;
use crate::dispatch::rank::Rank;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    /// Postgres URL. Without one, ranks live in memory only.
    pub database_url: Option<String>,

    /// Telegram handles that are always admins, e.g. `@someone`
    pub admin_handles: Vec<String>,
    /// Chats whose members count as whitelisted
    pub whitelist_chat_ids: Vec<i64>,
    /// Rank recorded for users seen for the first time
    pub default_rank: Rank,

    pub store_timeout: Duration,
    pub reply_timeout: Duration,
    /// Tell users when a command is refused
    pub notify_denied: bool,

    /// Where the generated command listing is written at startup
    pub help_listing_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let telegram_bot_token = var("TELEGRAM_BOT_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("TELEGRAM_BOT_TOKEN is not set"))?;

        let admin_handles = var("ADMIN_HANDLES")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let whitelist_chat_ids = var("WHITELIST_CHAT_IDS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|e| anyhow::anyhow!("invalid chat id '{}' in WHITELIST_CHAT_IDS: {}", s, e))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let default_rank: Rank = var("DEFAULT_RANK")
            .unwrap_or_else(|| "anybody".to_string())
            .parse()?;
        if default_rank == Rank::Nobody {
            anyhow::bail!("DEFAULT_RANK cannot be 'nobody', it is only valid as a requirement");
        }

        Ok(Self {
            telegram_bot_token,
            database_url: var("DATABASE_URL").filter(|u| !u.is_empty()),
            admin_handles,
            whitelist_chat_ids,
            default_rank,
            store_timeout: Duration::from_millis(
                var("STORE_TIMEOUT_MS")
                    .unwrap_or_else(|| "2000".to_string())
                    .parse()?,
            ),
            reply_timeout: Duration::from_millis(
                var("REPLY_TIMEOUT_MS")
                    .unwrap_or_else(|| "5000".to_string())
                    .parse()?,
            ),
            notify_denied: var("NOTIFY_DENIED")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            help_listing_path: var("HELP_LISTING_PATH")
                .unwrap_or_else(|| "./data/commands.txt".to_string())
                .into(),
        })
    }

    pub fn access_settings(&self) -> AccessSettings {
        AccessSettings {
            admin_handles: self.admin_handles.clone(),
            whitelisted_chats: self.whitelist_chat_ids.clone(),
            default_rank: self.default_rank,
            store_timeout: self.store_timeout,
        }
    }
}
