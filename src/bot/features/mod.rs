//! The bot's own commands. Each module registers its bindings explicitly.

pub mod admin;
pub mod example;
pub mod info;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::dispatch::access::AccessEvaluator;
use crate::dispatch::binding::BindingTable;
use crate::dispatch::error::DispatchError;

/// What feature handlers need from the rest of the bot.
#[derive(Clone)]
pub struct FeatureDeps {
    pub access: Arc<AccessEvaluator>,
    pub help_listing_path: PathBuf,
    /// Filled in once registration is complete.
    pub help_listing: Arc<OnceLock<String>>,
}

pub fn register_all(table: &mut BindingTable, deps: &FeatureDeps) -> Result<(), DispatchError> {
    info::register(table, deps)?;
    admin::register(table, deps)?;
    example::register(table)?;
    Ok(())
}
