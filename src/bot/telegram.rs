use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    Chat, InlineKeyboardButton, InlineKeyboardMarkup, InlineQueryResult, InlineQueryResultArticle,
    InputMessageContent, InputMessageContentText, User,
};

use crate::bot::AppState;
use crate::dispatch::event::{Actor, ChatKind, ChatRef, InboundEvent, Payload};
use crate::dispatch::reply::{InlineArticle, Reply};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub async fn on_message(bot: Bot, msg: Message, state: Arc<AppState>) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat = chat_ref(&msg.chat);
    let user = msg.from.as_ref().map(actor);
    let Some(event) = InboundEvent::from_text(Some(chat), user, text, state.bot_username.as_deref())
    else {
        tracing::debug!(chat_id = chat.id, "Command addressed to another bot");
        return Ok(());
    };
    let reply = TelegramReply::new(bot, state.config.reply_timeout).in_chat(msg.chat.id);

    let outcome = state.dispatcher.dispatch(event, Arc::new(reply)).await;
    tracing::debug!(chat_id = chat.id, ?outcome, "Message dispatched");
    Ok(())
}

pub async fn on_inline_query(bot: Bot, q: InlineQuery, state: Arc<AppState>) -> HandlerResult {
    let event = InboundEvent {
        chat: None,
        user: Some(actor(&q.from)),
        payload: Payload::InlineQuery {
            id: q.id.clone(),
            query: q.query.clone(),
        },
    };
    let reply = TelegramReply::new(bot, state.config.reply_timeout).for_inline_query(q.id.clone());

    let outcome = state.dispatcher.dispatch(event, Arc::new(reply)).await;
    tracing::debug!(user_id = q.from.id.0, ?outcome, "Inline query dispatched");
    Ok(())
}

pub async fn on_callback_query(bot: Bot, q: CallbackQuery, state: Arc<AppState>) -> HandlerResult {
    let Some(data) = q.data.clone() else {
        return Ok(());
    };

    let chat = q.message.as_ref().map(|m| m.chat());
    let event = InboundEvent {
        chat: chat.map(chat_ref),
        user: Some(actor(&q.from)),
        payload: Payload::CallbackQuery {
            id: q.id.clone(),
            data,
        },
    };
    let mut reply = TelegramReply::new(bot, state.config.reply_timeout).for_callback(q.id.clone());
    if let Some(chat) = chat {
        reply = reply.in_chat(chat.id);
    }

    let outcome = state.dispatcher.dispatch(event, Arc::new(reply)).await;
    tracing::debug!(user_id = q.from.id.0, ?outcome, "Callback query dispatched");
    Ok(())
}

fn actor(user: &User) -> Actor {
    Actor {
        id: user.id.0 as i64,
        handle: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

fn chat_ref(chat: &Chat) -> ChatRef {
    let kind = if chat.is_private() {
        ChatKind::Private
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else if chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Group
    };
    ChatRef { id: chat.id.0, kind }
}

/// [`Reply`] backed by the Bot API. Every call is bounded by `timeout`.
pub struct TelegramReply {
    bot: Bot,
    timeout: Duration,
    chat_id: Option<ChatId>,
    inline_query_id: Option<String>,
    callback_query_id: Option<String>,
}

impl TelegramReply {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self {
            bot,
            timeout,
            chat_id: None,
            inline_query_id: None,
            callback_query_id: None,
        }
    }

    pub fn in_chat(mut self, chat_id: ChatId) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    pub fn for_inline_query(mut self, id: String) -> Self {
        self.inline_query_id = Some(id);
        self
    }

    pub fn for_callback(mut self, id: String) -> Self {
        self.callback_query_id = Some(id);
        self
    }

    fn chat(&self) -> anyhow::Result<ChatId> {
        self.chat_id
            .ok_or_else(|| anyhow::anyhow!("event has no chat to reply to"))
    }

    async fn bounded<T, E, F>(&self, call: F) -> anyhow::Result<T>
    where
        F: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| anyhow::anyhow!("Telegram call timed out after {}ms", self.timeout.as_millis()))?
            .map_err(Into::into)
    }
}

#[async_trait]
impl Reply for TelegramReply {
    async fn send_text(&self, text: &str) -> anyhow::Result<()> {
        let chat_id = self.chat()?;
        self.bounded(self.bot.send_message(chat_id, text).send()).await?;
        Ok(())
    }

    async fn send_buttons(&self, text: &str, buttons: &[(String, String)]) -> anyhow::Result<()> {
        let chat_id = self.chat()?;
        let row: Vec<_> = buttons
            .iter()
            .map(|(label, token)| InlineKeyboardButton::callback(label.clone(), token.clone()))
            .collect();
        let keyboard = InlineKeyboardMarkup::new(vec![row]);
        let request = self.bot.send_message(chat_id, text).reply_markup(keyboard);
        self.bounded(request.send()).await?;
        Ok(())
    }

    async fn answer_inline(&self, results: Vec<InlineArticle>) -> anyhow::Result<()> {
        let id = self
            .inline_query_id
            .clone()
            .ok_or_else(|| anyhow::anyhow!("event is not an inline query"))?;
        let results: Vec<InlineQueryResult> = results
            .into_iter()
            .map(|a| {
                InlineQueryResult::Article(
                    InlineQueryResultArticle::new(
                        a.id,
                        a.title,
                        InputMessageContent::Text(InputMessageContentText::new(a.message_text)),
                    )
                    .description(a.description),
                )
            })
            .collect();
        self.bounded(self.bot.answer_inline_query(id, results).send()).await?;
        Ok(())
    }

    async fn answer_callback(&self, text: Option<&str>) -> anyhow::Result<()> {
        let id = self
            .callback_query_id
            .clone()
            .ok_or_else(|| anyhow::anyhow!("event is not a callback query"))?;
        let mut request = self.bot.answer_callback_query(id);
        if let Some(text) = text {
            request = request.text(text);
        }
        self.bounded(request.send()).await?;
        Ok(())
    }
}
