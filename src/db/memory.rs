use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::models::UserRecord;
use super::RankStore;
use crate::dispatch::rank::Rank;

/// Process-local rank store. Used when no database is configured; ranks are
/// lost on restart.
#[derive(Debug, Default)]
pub struct MemoryRankStore {
    users: Mutex<HashMap<i64, UserRecord>>,
}

impl MemoryRankStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<i64, UserRecord>>> {
        self.users
            .lock()
            .map_err(|_| anyhow::anyhow!("memory rank store lock poisoned"))
    }
}

#[async_trait]
impl RankStore for MemoryRankStore {
    async fn get(&self, user_id: i64) -> anyhow::Result<Option<UserRecord>> {
        Ok(self.lock()?.get(&user_id).cloned())
    }

    async fn upsert(&self, record: &UserRecord) -> anyhow::Result<()> {
        let mut users = self.lock()?;
        match users.get_mut(&record.user_id) {
            Some(existing) => {
                if record.handle.is_some() {
                    existing.handle = record.handle.clone();
                }
                existing.display_name = record.display_name.clone();
            }
            None => {
                users.insert(record.user_id, record.clone());
            }
        }
        Ok(())
    }

    async fn set_rank(&self, user_id: i64, rank: Rank) -> anyhow::Result<bool> {
        Ok(match self.lock()?.get_mut(&user_id) {
            Some(existing) => {
                existing.rank = rank;
                true
            }
            None => false,
        })
    }
}
