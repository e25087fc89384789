use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::error::DispatchError;
use super::event::Actor;
use super::rank::Rank;
use crate::db::RankStore;

/// Static part of the access policy, loaded once from configuration.
#[derive(Debug, Clone)]
pub struct AccessSettings {
    pub admin_handles: Vec<String>,
    pub whitelisted_chats: Vec<i64>,
    /// Rank for users the store knows nothing about.
    pub default_rank: Rank,
    pub store_timeout: Duration,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            admin_handles: Vec::new(),
            whitelisted_chats: Vec::new(),
            default_rank: Rank::Anybody,
            store_timeout: Duration::from_secs(2),
        }
    }
}

pub struct AccessEvaluator {
    admins: HashSet<String>,
    whitelisted_chats: HashSet<i64>,
    default_rank: Rank,
    store_timeout: Duration,
    store: Arc<dyn RankStore>,
}

impl AccessEvaluator {
    pub fn new(store: Arc<dyn RankStore>, settings: AccessSettings) -> Self {
        Self {
            admins: settings
                .admin_handles
                .iter()
                .map(|h| normalize_handle(h))
                .filter(|h| !h.is_empty())
                .collect(),
            whitelisted_chats: settings.whitelisted_chats.into_iter().collect(),
            // Nobody would sort above Admin; users never hold it.
            default_rank: match settings.default_rank {
                Rank::Nobody => Rank::Anybody,
                rank => rank,
            },
            store_timeout: settings.store_timeout,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn RankStore> {
        &self.store
    }

    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    pub fn default_rank(&self) -> Rank {
        self.default_rank
    }

    pub fn is_static_admin(&self, user: &Actor) -> bool {
        user.handle
            .as_deref()
            .is_some_and(|h| self.admins.contains(&normalize_handle(h)))
    }

    /// Rank recorded in the store, if the user has a record.
    pub async fn persisted_rank(&self, user_id: i64) -> Result<Option<Rank>, DispatchError> {
        let record = store_call(self.store_timeout, self.store.get(user_id)).await?;
        Ok(record.map(|r| match r.rank {
            Rank::Nobody => Rank::Anybody,
            rank => rank,
        }))
    }

    /// Admin allow-list, then chat whitelist, then the store, then the default.
    ///
    /// A failing store degrades the user to `Anybody`.
    pub async fn effective_rank(&self, chat_id: Option<i64>, user: &Actor) -> Rank {
        if self.is_static_admin(user) {
            return Rank::Admin;
        }
        if chat_id.is_some_and(|id| self.whitelisted_chats.contains(&id)) {
            return Rank::Whitelisted;
        }
        match self.persisted_rank(user.id).await {
            Ok(Some(rank)) => rank,
            Ok(None) => self.default_rank,
            Err(e) => {
                tracing::warn!(
                    user_id = user.id,
                    error = %e,
                    "Rank lookup failed, treating user as anybody"
                );
                Rank::Anybody
            }
        }
    }
}

/// Whether a user holding `effective` may use something that requires
/// `required`.
pub fn authorize(required: Rank, effective: Rank) -> bool {
    match required {
        Rank::Nobody => false,
        Rank::Anybody => true,
        _ => effective <= required,
    }
}

/// Run a store operation under the configured timeout.
pub(crate) async fn store_call<T, F>(limit: Duration, op: F) -> Result<T, DispatchError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, op).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(DispatchError::StoreUnavailable(e.to_string())),
        Err(_) => Err(DispatchError::StoreUnavailable(format!(
            "timed out after {}ms",
            limit.as_millis()
        ))),
    }
}

fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_lowercase()
}
