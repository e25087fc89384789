pub mod features;
pub mod telegram;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::dptree;
use teloxide::prelude::*;

use crate::config::AppConfig;
use crate::dispatch::dispatcher::Dispatcher;

/// Shared application state, accessible from all handlers.
pub struct AppState {
    pub config: AppConfig,
    /// Our own username, for telling apart `/cmd@us` from `/cmd@other_bot`
    pub bot_username: Option<String>,
    pub dispatcher: Dispatcher,
}

/// Build the teloxide update handler tree. Every branch converts the update
/// and hands it to the routing core.
pub fn build_handler() -> teloxide::dispatching::UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    let message_handler = Update::filter_message().endpoint(telegram::on_message);

    let inline_handler = Update::filter_inline_query().endpoint(telegram::on_inline_query);

    let callback_handler = Update::filter_callback_query().endpoint(telegram::on_callback_query);

    dptree::entry()
        .branch(message_handler)
        .branch(inline_handler)
        .branch(callback_handler)
}
