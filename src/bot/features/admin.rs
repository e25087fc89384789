use std::sync::Arc;

use async_trait::async_trait;

use super::FeatureDeps;
use crate::dispatch::access::{store_call, AccessEvaluator};
use crate::dispatch::binding::{BindingOptions, BindingTable, ChatScope, Handler};
use crate::dispatch::error::DispatchError;
use crate::dispatch::event::{Category, InboundEvent};
use crate::dispatch::rank::Rank;
use crate::dispatch::reply::Reply;

const USAGE: &str = "Usage: /setrank <user id> <admin|whitelisted|anybody>";

pub fn register(table: &mut BindingTable, deps: &FeatureDeps) -> Result<(), DispatchError> {
    table.register(
        Category::Command,
        ["setrank"],
        Arc::new(SetRankHandler {
            access: Arc::clone(&deps.access),
        }),
        BindingOptions::default()
            .description("Change a user's rank")
            .rank(Rank::Admin)
            .scope(ChatScope::Private),
    )
}

pub struct SetRankHandler {
    access: Arc<AccessEvaluator>,
}

fn parse_args(args: &str) -> Option<(i64, Rank)> {
    let mut parts = args.split_whitespace();
    let user_id = parts.next()?.parse().ok()?;
    let rank: Rank = parts.next()?.parse().ok()?;
    if parts.next().is_some() || rank == Rank::Nobody {
        return None;
    }
    Some((user_id, rank))
}

#[async_trait]
impl Handler for SetRankHandler {
    async fn handle(&self, event: &InboundEvent, reply: Arc<dyn Reply>) -> anyhow::Result<()> {
        let Some((user_id, rank)) = parse_args(event.text()) else {
            return reply.send_text(USAGE).await;
        };

        let store = self.access.store();
        let updated = store_call(self.access.store_timeout(), store.set_rank(user_id, rank)).await?;
        if !updated {
            return reply
                .send_text(&format!("User {} has not been seen yet.", user_id))
                .await;
        }

        let by = event.user.as_ref().map(|u| u.id);
        tracing::info!(
            ?by,
            user_id,
            %rank,
            "Rank changed"
        );
        reply
            .send_text(&format!("User {} is now {}.", user_id, rank))
            .await
    }
}
