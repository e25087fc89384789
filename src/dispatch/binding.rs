use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use super::error::DispatchError;
use super::event::{Category, ChatKind, InboundEvent};
use super::rank::Rank;
use super::reply::Reply;

/// Something that reacts to a routed event.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, event: &InboundEvent, reply: Arc<dyn Reply>) -> anyhow::Result<()>;
}

/// Adapter so plain async functions and closures can be registered.
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(InboundEvent, Arc<dyn Reply>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn handle(&self, event: &InboundEvent, reply: Arc<dyn Reply>) -> anyhow::Result<()> {
        (self.0)(event.clone(), reply).await
    }
}

pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(InboundEvent, Arc<dyn Reply>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Kind of chat a binding may be used from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatScope {
    #[default]
    Any,
    Private,
    Group,
}

impl ChatScope {
    pub fn admits(self, kind: Option<ChatKind>) -> bool {
        match self {
            ChatScope::Any => true,
            ChatScope::Private => kind == Some(ChatKind::Private),
            ChatScope::Group => matches!(kind, Some(ChatKind::Group | ChatKind::Supergroup)),
        }
    }

    /// Notice sent when the scope rejects an event.
    pub fn rejection_notice(self) -> Option<&'static str> {
        match self {
            ChatScope::Any => None,
            ChatScope::Private => Some("This command can only be used in private chats"),
            ChatScope::Group => Some("This command can only be used in group chats"),
        }
    }
}

/// Per-registration settings.
#[derive(Debug, Clone)]
pub struct BindingOptions {
    pub rank: Rank,
    pub description: String,
    pub scope: ChatScope,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            rank: Rank::Anybody,
            description: String::new(),
            scope: ChatScope::Any,
        }
    }
}

impl BindingOptions {
    pub fn rank(mut self, rank: Rank) -> Self {
        self.rank = rank;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn scope(mut self, scope: ChatScope) -> Self {
        self.scope = scope;
        self
    }
}

pub struct Binding {
    pub key: String,
    pub category: Category,
    pub required_rank: Rank,
    pub description: String,
    pub scope: ChatScope,
    /// Other keys registered in the same call, sharing this handler.
    pub aliases: Vec<String>,
    pub handler: Arc<dyn Handler>,
    matcher: Option<Regex>,
}

impl Binding {
    fn matches(&self, input: &str) -> bool {
        match &self.matcher {
            Some(re) => re.is_match(input),
            None => self.key == input,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("category", &self.category)
            .field("required_rank", &self.required_rank)
            .field("scope", &self.scope)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct CategoryTable {
    bindings: Vec<Binding>,
    index: HashMap<String, usize>,
}

/// Registry of every handler the bot knows, split by [`Category`].
///
/// Filled once during startup, then moved into the dispatcher and only read.
#[derive(Default)]
pub struct BindingTable {
    tables: [CategoryTable; 4],
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every key in `keys` to `handler`.
    ///
    /// Text message and inline query keys are regular expressions. Nothing is
    /// recorded if any key is rejected.
    pub fn register<I, S>(
        &mut self,
        category: Category,
        keys: I,
        handler: Arc<dyn Handler>,
        options: BindingOptions,
    ) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(DispatchError::EmptyTriggers);
        }

        let table = &mut self.tables[category.index()];
        let mut seen = HashSet::new();
        for key in &keys {
            if table.index.contains_key(key) || !seen.insert(key.as_str()) {
                return Err(DispatchError::Conflict {
                    category,
                    key: key.clone(),
                });
            }
        }

        let matchers = keys
            .iter()
            .map(|key| compile(category, key))
            .collect::<Result<Vec<_>, _>>()?;

        for (key, matcher) in keys.iter().zip(matchers) {
            tracing::debug!(%category, key = %key, rank = %options.rank, "Registering binding");
            let aliases = keys.iter().filter(|k| *k != key).cloned().collect();
            table.index.insert(key.clone(), table.bindings.len());
            table.bindings.push(Binding {
                key: key.clone(),
                category,
                required_rank: options.rank,
                description: options.description.clone(),
                scope: options.scope,
                aliases,
                handler: Arc::clone(&handler),
                matcher,
            });
        }

        Ok(())
    }

    /// Find the binding for an incoming routing key.
    ///
    /// Commands and callback tokens match exactly. Patterns are tried in
    /// registration order and the first hit wins.
    pub fn resolve(&self, category: Category, input: &str) -> Option<&Binding> {
        let table = &self.tables[category.index()];
        match category {
            Category::Command | Category::CallbackQuery => {
                table.index.get(input).map(|&i| &table.bindings[i])
            }
            Category::TextMessage | Category::InlineQuery => {
                table.bindings.iter().find(|b| b.matches(input))
            }
        }
    }

    /// `(command, description)` pairs in registration order.
    pub fn describe_all(&self) -> Vec<(&str, &str)> {
        self.tables[Category::Command.index()]
            .bindings
            .iter()
            .map(|b| (b.key.as_str(), b.description.as_str()))
            .collect()
    }

    pub fn help_listing(&self) -> String {
        self.describe_all()
            .into_iter()
            .map(|(key, description)| format!("/{} - {}", key, description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn keys(&self, category: Category) -> Vec<&str> {
        self.tables[category.index()]
            .bindings
            .iter()
            .map(|b| b.key.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tables.iter().map(|t| t.bindings.len()).sum()
    }
}

fn compile(category: Category, key: &str) -> Result<Option<Regex>, DispatchError> {
    let source = match category {
        Category::Command | Category::CallbackQuery => return Ok(None),
        Category::TextMessage => key.to_string(),
        // Inline patterns are anchored at the start of the query.
        Category::InlineQuery => format!("^(?:{})", key),
    };
    Regex::new(&source)
        .map(Some)
        .map_err(|source| DispatchError::InvalidPattern {
            pattern: key.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Arc<dyn Handler> {
        handler_fn(|_event, _reply| async { anyhow::Ok(()) })
    }

    #[test]
    fn duplicate_key_in_category_conflicts() {
        let mut table = BindingTable::new();
        table
            .register(Category::Command, ["start"], noop(), BindingOptions::default())
            .unwrap();

        let err = table
            .register(Category::Command, ["help", "start"], noop(), BindingOptions::default())
            .unwrap_err();
        assert!(matches!(err, DispatchError::Conflict { key, .. } if key == "start"));
        // all-or-nothing: "help" was not recorded either
        assert!(table.resolve(Category::Command, "help").is_none());
    }

    #[test]
    fn same_key_in_other_category_is_fine() {
        let mut table = BindingTable::new();
        table
            .register(Category::Command, ["ping"], noop(), BindingOptions::default())
            .unwrap();
        table
            .register(Category::CallbackQuery, ["ping"], noop(), BindingOptions::default())
            .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn repeated_key_within_one_call_conflicts() {
        let mut table = BindingTable::new();
        let err = table
            .register(Category::Command, ["a", "a"], noop(), BindingOptions::default())
            .unwrap_err();
        assert!(matches!(err, DispatchError::Conflict { .. }));
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn empty_and_invalid_triggers_are_rejected() {
        let mut table = BindingTable::new();
        let none: [&str; 0] = [];
        assert!(matches!(
            table.register(Category::Command, none, noop(), BindingOptions::default()),
            Err(DispatchError::EmptyTriggers)
        ));
        assert!(matches!(
            table.register(Category::TextMessage, ["?"], noop(), BindingOptions::default()),
            Err(DispatchError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn patterns_resolve_in_registration_order() {
        let mut table = BindingTable::new();
        table
            .register(
                Category::TextMessage,
                ["a.*"],
                noop(),
                BindingOptions::default().description("first"),
            )
            .unwrap();
        table
            .register(
                Category::TextMessage,
                [".*"],
                noop(),
                BindingOptions::default().description("second"),
            )
            .unwrap();

        assert_eq!(table.resolve(Category::TextMessage, "abc").unwrap().key, "a.*");
        assert_eq!(table.resolve(Category::TextMessage, "xyz").unwrap().key, ".*");
    }

    #[test]
    fn inline_patterns_are_anchored_at_start() {
        let mut table = BindingTable::new();
        table
            .register(Category::InlineQuery, ["test"], noop(), BindingOptions::default())
            .unwrap();
        assert!(table.resolve(Category::InlineQuery, "testing").is_some());
        assert!(table.resolve(Category::InlineQuery, "a test").is_none());
    }

    #[test]
    fn commands_and_callbacks_match_exactly() {
        let mut table = BindingTable::new();
        table
            .register(Category::Command, ["start"], noop(), BindingOptions::default())
            .unwrap();
        table
            .register(Category::CallbackQuery, ["ping"], noop(), BindingOptions::default())
            .unwrap();
        assert!(table.resolve(Category::Command, "star").is_none());
        assert!(table.resolve(Category::Command, "start").is_some());
        assert!(table.resolve(Category::CallbackQuery, "ping!").is_none());
    }

    #[test]
    fn aliases_share_options_and_know_each_other() {
        let mut table = BindingTable::new();
        table
            .register(
                Category::Command,
                ["start", "help"],
                noop(),
                BindingOptions::default()
                    .description("Show commands")
                    .rank(Rank::Whitelisted),
            )
            .unwrap();

        let help = table.resolve(Category::Command, "help").unwrap();
        assert_eq!(help.aliases, vec!["start".to_string()]);
        assert_eq!(help.required_rank, Rank::Whitelisted);
        assert_eq!(table.keys(Category::Command), vec!["start", "help"]);
    }

    #[test]
    fn help_listing_follows_registration_order() {
        let mut table = BindingTable::new();
        table
            .register(
                Category::Command,
                ["start"],
                noop(),
                BindingOptions::default().description("Show commands"),
            )
            .unwrap();
        table
            .register(
                Category::Command,
                ["ban"],
                noop(),
                BindingOptions::default().description("Ban a user").rank(Rank::Admin),
            )
            .unwrap();
        table
            .register(Category::TextMessage, [".+"], noop(), BindingOptions::default())
            .unwrap();

        assert_eq!(
            table.describe_all(),
            vec![("start", "Show commands"), ("ban", "Ban a user")]
        );
        assert_eq!(table.help_listing(), "/start - Show commands\n/ban - Ban a user");
    }

    #[test]
    fn scope_admits_matching_chat_kinds() {
        assert!(ChatScope::Any.admits(None));
        assert!(ChatScope::Private.admits(Some(ChatKind::Private)));
        assert!(!ChatScope::Private.admits(Some(ChatKind::Group)));
        assert!(ChatScope::Group.admits(Some(ChatKind::Supergroup)));
        assert!(!ChatScope::Group.admits(None));
    }
}
