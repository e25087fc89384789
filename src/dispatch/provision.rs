use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;

use super::access::{store_call, AccessEvaluator};
use super::event::Actor;
use crate::db::models::UserRecord;

/// Records users in the rank store the first time they show up in a chat.
///
/// The membership cache only saves round-trips. Losing it costs extra
/// upserts, which the store treats as no-ops.
pub struct UserProvisioner {
    access: Arc<AccessEvaluator>,
    seen: DashMap<i64, HashSet<i64>>,
}

impl UserProvisioner {
    pub fn new(access: Arc<AccessEvaluator>) -> Self {
        Self {
            access,
            seen: DashMap::new(),
        }
    }

    pub fn is_cached(&self, chat_id: i64, user_id: i64) -> bool {
        self.seen
            .get(&chat_id)
            .is_some_and(|users| users.contains(&user_id))
    }

    /// Returns `true` when this call recorded the user.
    pub async fn ensure_provisioned(&self, chat_id: i64, user: &Actor) -> bool {
        if self.is_cached(chat_id, user.id) {
            return false;
        }

        let rank = match self.access.persisted_rank(user.id).await {
            Ok(Some(rank)) => rank,
            Ok(None) => self.access.default_rank(),
            Err(e) => {
                tracing::warn!(
                    user_id = user.id,
                    chat_id,
                    error = %e,
                    "Rank lookup failed during provisioning"
                );
                self.access.default_rank()
            }
        };

        let record = UserRecord::new(user, chat_id, rank);
        let upsert = self.access.store().upsert(&record);
        if let Err(e) = store_call(self.access.store_timeout(), upsert).await {
            tracing::warn!(user_id = user.id, chat_id, error = %e, "Could not provision user");
            return false;
        }

        // Two events from the same new user may race here; only one inserts.
        let inserted = self.seen.entry(chat_id).or_default().insert(user.id);
        if inserted {
            tracing::info!(
                user = %user.label(),
                user_id = user.id,
                chat_id,
                %rank,
                "Provisioned user"
            );
        }
        inserted
    }
}
