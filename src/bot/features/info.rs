use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::fs;

use super::FeatureDeps;
use crate::dispatch::access::AccessEvaluator;
use crate::dispatch::binding::{BindingOptions, BindingTable, Handler};
use crate::dispatch::error::DispatchError;
use crate::dispatch::event::{Category, InboundEvent};
use crate::dispatch::reply::Reply;

pub fn register(table: &mut BindingTable, deps: &FeatureDeps) -> Result<(), DispatchError> {
    table.register(
        Category::Command,
        ["start", "help"],
        Arc::new(HelpHandler {
            path: deps.help_listing_path.clone(),
            fallback: Arc::clone(&deps.help_listing),
        }),
        BindingOptions::default().description("Show commands"),
    )?;
    table.register(
        Category::Command,
        ["rank"],
        Arc::new(RankHandler {
            access: Arc::clone(&deps.access),
        }),
        BindingOptions::default().description("Show your rank"),
    )?;
    Ok(())
}

/// Write the command listing where [`HelpHandler`] reads it back.
pub async fn write_help_listing(path: &Path, listing: &str) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir).await?;
        }
    }
    fs::write(path, listing).await?;
    tracing::info!("Wrote command listing to {:?}", path);
    Ok(())
}

/// Replies with the generated command listing.
pub struct HelpHandler {
    path: PathBuf,
    fallback: Arc<OnceLock<String>>,
}

#[async_trait]
impl Handler for HelpHandler {
    async fn handle(&self, _event: &InboundEvent, reply: Arc<dyn Reply>) -> anyhow::Result<()> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Command listing {:?} unreadable: {}", self.path, e);
                self.fallback.get().cloned().unwrap_or_default()
            }
        };
        if text.trim().is_empty() {
            return reply.send_text("No commands available.").await;
        }
        reply.send_text(&text).await
    }
}

pub struct RankHandler {
    access: Arc<AccessEvaluator>,
}

#[async_trait]
impl Handler for RankHandler {
    async fn handle(&self, event: &InboundEvent, reply: Arc<dyn Reply>) -> anyhow::Result<()> {
        let Some(user) = event.user.as_ref() else {
            return Ok(());
        };
        let rank = self.access.effective_rank(event.chat_id(), user).await;
        reply.send_text(&format!("Your rank: {}", rank)).await
    }
}
