use std::sync::{Arc, OnceLock};

use teloxide::prelude::*;
use tracing_subscriber::EnvFilter;

mod bot;
mod config;
mod db;
mod dispatch;

use bot::features::{self, FeatureDeps};
use config::AppConfig;
use db::memory::MemoryRankStore;
use db::{Database, RankStore};
use dispatch::access::AccessEvaluator;
use dispatch::binding::BindingTable;
use dispatch::dispatcher::Dispatcher;
use dispatch::event::Category;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting rank gate bot...");

    // Load config
    let config = AppConfig::from_env()?;
    tracing::info!(
        admins = config.admin_handles.len(),
        whitelisted_chats = config.whitelist_chat_ids.len(),
        default_rank = %config.default_rank,
        "Config loaded."
    );

    // Rank store
    let store: Arc<dyn RankStore> = match &config.database_url {
        Some(url) => {
            let db = Database::connect(url).await?;
            db.run_migrations().await?;
            tracing::info!("Database connected and migrations applied.");
            Arc::new(db)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, ranks are kept in memory only.");
            Arc::new(MemoryRankStore::new())
        }
    };

    let access = Arc::new(AccessEvaluator::new(store, config.access_settings()));

    // Register every feature before serving events
    let deps = FeatureDeps {
        access: Arc::clone(&access),
        help_listing_path: config.help_listing_path.clone(),
        help_listing: Arc::new(OnceLock::new()),
    };
    let mut table = BindingTable::new();
    features::register_all(&mut table, &deps)?;

    tracing::info!(total = table.len(), "Bindings registered");
    for category in Category::ALL {
        tracing::info!(%category, keys = ?table.keys(category), "Registered bindings");
    }

    let listing = table.help_listing();
    if let Err(e) = features::info::write_help_listing(&config.help_listing_path, &listing).await {
        tracing::warn!("Could not write command listing: {}", e);
    }
    // The listing cell is only ever set here.
    if deps.help_listing.set(listing).is_err() {
        tracing::warn!("Command listing was already set");
    }

    // Create the Telegram bot
    let bot = Bot::new(&config.telegram_bot_token);
    let me = bot.get_me().await?;
    let bot_username = me.username.clone();
    tracing::info!(username = ?bot_username, "Authenticated with Telegram");

    // Build shared application state
    let state = Arc::new(bot::AppState {
        dispatcher: Dispatcher::new(table, access, config.notify_denied),
        bot_username,
        config: config.clone(),
    });

    // Build the dispatcher
    let handler = bot::build_handler();

    tracing::info!("Bot is online.");
    teloxide::dispatching::Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the update pipeline",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
