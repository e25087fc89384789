use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::dispatch::event::Actor;
use crate::dispatch::rank::Rank;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub handle: Option<String>,
    pub display_name: String,
    /// Chat the user was first seen in.
    pub chat_id: i64,
    #[sqlx(try_from = "i16")]
    pub rank: Rank,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(user: &Actor, chat_id: i64, rank: Rank) -> Self {
        Self {
            user_id: user.id,
            handle: user.handle.clone(),
            display_name: user.display_name(),
            chat_id,
            rank,
            created_at: Utc::now(),
        }
    }
}
