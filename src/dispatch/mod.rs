//! Routing core: binding registry, rank checks, first-contact provisioning
//! and the per-event dispatcher. Knows nothing about Telegram.

pub mod access;
pub mod binding;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod provision;
pub mod rank;
pub mod reply;

#[cfg(test)]
pub mod testing;
