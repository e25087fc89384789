use thiserror::Error;

use super::event::Category;

/// Errors raised by the routing core.
///
/// Denials and unmatched events are not errors; they are reported through
/// [`super::dispatcher::Outcome`].
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{category} trigger '{key}' is already registered")]
    Conflict { category: Category, key: String },

    #[error("a binding needs at least one trigger key")]
    EmptyTriggers,

    #[error("invalid trigger pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("rank store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("unknown rank: {0}")]
    InvalidRank(String),
}
