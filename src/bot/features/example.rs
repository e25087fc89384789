use std::sync::Arc;

use crate::dispatch::binding::{handler_fn, BindingOptions, BindingTable};
use crate::dispatch::error::DispatchError;
use crate::dispatch::event::{Category, InboundEvent};
use crate::dispatch::reply::{InlineArticle, Reply};

pub fn register(table: &mut BindingTable) -> Result<(), DispatchError> {
    table.register(
        Category::Command,
        ["menu"],
        handler_fn(menu),
        BindingOptions::default().description("Show a button"),
    )?;
    table.register(
        Category::CallbackQuery,
        ["ping"],
        handler_fn(pong),
        BindingOptions::default(),
    )?;
    table.register(
        Category::InlineQuery,
        ["test"],
        handler_fn(inline_results),
        BindingOptions::default(),
    )?;
    table.register(
        Category::TextMessage,
        [".+"],
        handler_fn(echo),
        BindingOptions::default(),
    )?;
    Ok(())
}

async fn menu(_event: InboundEvent, reply: Arc<dyn Reply>) -> anyhow::Result<()> {
    reply
        .send_buttons("Press the button", &[("Ping".to_string(), "ping".to_string())])
        .await
}

async fn pong(_event: InboundEvent, reply: Arc<dyn Reply>) -> anyhow::Result<()> {
    reply.answer_callback(Some("pong")).await
}

/// Echo the user message.
async fn echo(event: InboundEvent, reply: Arc<dyn Reply>) -> anyhow::Result<()> {
    reply.send_text(event.text()).await
}

async fn inline_results(event: InboundEvent, reply: Arc<dyn Reply>) -> anyhow::Result<()> {
    let query = event.text().to_string();
    let results = (0..5)
        .map(|i| InlineArticle {
            id: i.to_string(),
            title: i.to_string(),
            description: query.clone(),
            message_text: format!("{}: {}", i, query),
        })
        .collect();
    reply.answer_inline(results).await
}
