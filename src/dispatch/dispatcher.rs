use std::sync::Arc;

use super::access::{authorize, AccessEvaluator};
use super::binding::{Binding, BindingTable};
use super::event::InboundEvent;
use super::provision::UserProvisioner;
use super::rank::Rank;
use super::reply::Reply;

const DENIED_NOTICE: &str = "You are not allowed to do that.";

/// What happened to one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No binding matched; the event was dropped.
    Unmatched,
    /// The binding is restricted to another kind of chat.
    OutOfScope,
    Denied,
    Handled,
    /// The handler returned an error or panicked.
    Failed,
}

/// Routes inbound events to their bindings and enforces ranks.
pub struct Dispatcher {
    table: BindingTable,
    access: Arc<AccessEvaluator>,
    provisioner: UserProvisioner,
    notify_denied: bool,
}

impl Dispatcher {
    /// Takes ownership of the table; no bindings can be added afterwards.
    pub fn new(table: BindingTable, access: Arc<AccessEvaluator>, notify_denied: bool) -> Self {
        let provisioner = UserProvisioner::new(Arc::clone(&access));
        Self {
            table,
            access,
            provisioner,
            notify_denied,
        }
    }

    pub async fn dispatch(&self, event: InboundEvent, reply: Arc<dyn Reply>) -> Outcome {
        let category = event.category();
        let Some(binding) = self.table.resolve(category, event.routing_key()) else {
            tracing::debug!(%category, key = %event.routing_key(), "No binding matched");
            return Outcome::Unmatched;
        };

        if let (Some(chat), Some(user)) = (event.chat, event.user.as_ref()) {
            self.provisioner.ensure_provisioned(chat.id, user).await;
        }

        if !binding.scope.admits(event.chat.map(|c| c.kind)) {
            tracing::debug!(%category, key = %binding.key, scope = ?binding.scope, "Binding used outside its chat scope");
            if let Some(notice) = binding.scope.rejection_notice() {
                notify(reply.as_ref(), notice).await;
            }
            return Outcome::OutOfScope;
        }

        if !self.admit(binding, &event).await {
            let who = event
                .user
                .as_ref()
                .map(|u| u.label())
                .unwrap_or_else(|| "unknown".to_string());
            let action = format!("{} '{}'", category, binding.key);
            tracing::warn!(
                user = %who,
                chat_id = ?event.chat_id(),
                action = %action,
                required = %binding.required_rank,
                "Access denied"
            );
            if self.notify_denied {
                notify(reply.as_ref(), DENIED_NOTICE).await;
            }
            return Outcome::Denied;
        }

        self.run(binding, event, reply).await
    }

    async fn admit(&self, binding: &Binding, event: &InboundEvent) -> bool {
        if binding.required_rank == Rank::Anybody {
            return true;
        }
        let Some(user) = event.user.as_ref() else {
            return false;
        };
        let effective = self.access.effective_rank(event.chat_id(), user).await;
        authorize(binding.required_rank, effective)
    }

    async fn run(&self, binding: &Binding, event: InboundEvent, reply: Arc<dyn Reply>) -> Outcome {
        tracing::debug!(category = %binding.category, key = %binding.key, aliases = ?binding.aliases, "Running handler");
        let handler = Arc::clone(&binding.handler);
        let user_id = event.user.as_ref().map(|u| u.id);
        let chat_id = event.chat_id();

        // A separate task turns a panicking handler into a JoinError.
        let task = tokio::spawn(async move { handler.handle(&event, reply).await });
        match task.await {
            Ok(Ok(())) => Outcome::Handled,
            Ok(Err(e)) => {
                tracing::error!(category = %binding.category, key = %binding.key, ?user_id, ?chat_id, "Handler failed: {:#}", e);
                Outcome::Failed
            }
            Err(e) => {
                tracing::error!(category = %binding.category, key = %binding.key, ?user_id, ?chat_id, "Handler panicked: {}", e);
                Outcome::Failed
            }
        }
    }
}

async fn notify(reply: &dyn Reply, text: &str) {
    if let Err(e) = reply.send_text(text).await {
        tracing::warn!("Failed to send notice: {}", e);
    }
}
