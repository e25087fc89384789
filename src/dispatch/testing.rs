//! Doubles shared by the routing tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::event::{Actor, ChatKind, ChatRef, InboundEvent, Payload};
use super::rank::Rank;
use super::reply::{InlineArticle, Reply};
use crate::db::memory::MemoryRankStore;
use crate::db::models::UserRecord;
use crate::db::RankStore;

pub fn actor(id: i64, handle: Option<&str>) -> Actor {
    Actor {
        id,
        handle: handle.map(String::from),
        first_name: format!("user{}", id),
        last_name: None,
    }
}

pub fn group(id: i64) -> ChatRef {
    ChatRef {
        id,
        kind: ChatKind::Group,
    }
}

pub fn private(id: i64) -> ChatRef {
    ChatRef {
        id,
        kind: ChatKind::Private,
    }
}

pub fn command(chat: ChatRef, user: Actor, name: &str) -> InboundEvent {
    InboundEvent {
        chat: Some(chat),
        user: Some(user),
        payload: Payload::Command {
            name: name.to_string(),
            args: String::new(),
        },
    }
}

/// In-memory store that counts every call.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryRankStore,
    gets: AtomicUsize,
    upserts: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.gets() + self.upserts()
    }
}

#[async_trait]
impl RankStore for CountingStore {
    async fn get(&self, user_id: i64) -> anyhow::Result<Option<UserRecord>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(user_id).await
    }

    async fn upsert(&self, record: &UserRecord) -> anyhow::Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(record).await
    }

    async fn set_rank(&self, user_id: i64, rank: Rank) -> anyhow::Result<bool> {
        self.inner.set_rank(user_id, rank).await
    }
}

/// Store that never answers in time, or answers with an error.
pub struct FailingStore {
    hang: bool,
}

impl FailingStore {
    pub fn hanging() -> Self {
        Self { hang: true }
    }

    pub fn erroring() -> Self {
        Self { hang: false }
    }

    async fn fail<T>(&self) -> anyhow::Result<T> {
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        anyhow::bail!("connection refused")
    }
}

#[async_trait]
impl RankStore for FailingStore {
    async fn get(&self, _user_id: i64) -> anyhow::Result<Option<UserRecord>> {
        self.fail().await
    }

    async fn upsert(&self, _record: &UserRecord) -> anyhow::Result<()> {
        self.fail().await
    }

    async fn set_rank(&self, _user_id: i64, _rank: Rank) -> anyhow::Result<bool> {
        self.fail().await
    }
}

/// Reply capability that remembers what was sent.
#[derive(Default)]
pub struct RecordingReply {
    pub texts: Mutex<Vec<String>>,
    pub buttons: Mutex<Vec<(String, String)>>,
    pub inline: Mutex<Vec<InlineArticle>>,
    pub callback_answers: Mutex<Vec<Option<String>>>,
}

impl RecordingReply {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reply for RecordingReply {
    async fn send_text(&self, text: &str) -> anyhow::Result<()> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn send_buttons(&self, text: &str, buttons: &[(String, String)]) -> anyhow::Result<()> {
        self.texts.lock().unwrap().push(text.to_string());
        self.buttons.lock().unwrap().extend(buttons.iter().cloned());
        Ok(())
    }

    async fn answer_inline(&self, results: Vec<InlineArticle>) -> anyhow::Result<()> {
        self.inline.lock().unwrap().extend(results);
        Ok(())
    }

    async fn answer_callback(&self, text: Option<&str>) -> anyhow::Result<()> {
        self.callback_answers
            .lock()
            .unwrap()
            .push(text.map(String::from));
        Ok(())
    }
}
