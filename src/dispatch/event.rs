use std::fmt;

/// Partition of inbound events. Each category has its own binding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Command,
    TextMessage,
    InlineQuery,
    CallbackQuery,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Command,
        Category::TextMessage,
        Category::InlineQuery,
        Category::CallbackQuery,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Category::Command => 0,
            Category::TextMessage => 1,
            Category::InlineQuery => 2,
            Category::CallbackQuery => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Command => "command",
            Category::TextMessage => "text message",
            Category::InlineQuery => "inline query",
            Category::CallbackQuery => "callback query",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatRef {
    pub id: i64,
    pub kind: ChatKind,
}

/// The user who triggered an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub handle: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl Actor {
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }

    /// Handle when known, numeric id otherwise. Used in log lines.
    pub fn label(&self) -> String {
        match &self.handle {
            Some(handle) => format!("@{}", handle),
            None => self.id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Command { name: String, args: String },
    Text(String),
    InlineQuery { id: String, query: String },
    CallbackQuery { id: String, data: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat: Option<ChatRef>,
    pub user: Option<Actor>,
    pub payload: Payload,
}

impl InboundEvent {
    /// Classify a chat message: `/name args` becomes a command, anything else
    /// is free text.
    ///
    /// Returns `None` for commands addressed to another bot.
    pub fn from_text(
        chat: Option<ChatRef>,
        user: Option<Actor>,
        text: &str,
        bot_username: Option<&str>,
    ) -> Option<Self> {
        let payload = match parse_command(text, bot_username) {
            Some((name, args)) => Payload::Command { name, args },
            None if split_command(text).is_some() => return None,
            None => Payload::Text(text.to_string()),
        };
        Some(Self { chat, user, payload })
    }

    pub fn category(&self) -> Category {
        match self.payload {
            Payload::Command { .. } => Category::Command,
            Payload::Text(_) => Category::TextMessage,
            Payload::InlineQuery { .. } => Category::InlineQuery,
            Payload::CallbackQuery { .. } => Category::CallbackQuery,
        }
    }

    /// The field the binding table matches against.
    pub fn routing_key(&self) -> &str {
        match &self.payload {
            Payload::Command { name, .. } => name,
            Payload::Text(text) => text,
            Payload::InlineQuery { query, .. } => query,
            Payload::CallbackQuery { data, .. } => data,
        }
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.chat.map(|c| c.id)
    }

    /// Text that came with the event, if any: command arguments, the message
    /// itself or the inline query.
    pub fn text(&self) -> &str {
        match &self.payload {
            Payload::Command { args, .. } => args,
            Payload::Text(text) => text,
            Payload::InlineQuery { query, .. } => query,
            Payload::CallbackQuery { data, .. } => data,
        }
    }
}

struct CommandText<'a> {
    name: String,
    target: Option<&'a str>,
    args: &'a str,
}

impl CommandText<'_> {
    /// Unaddressed commands are for everyone. Addressed ones only count when
    /// the bot knows its own username and it matches.
    fn is_for(&self, bot_username: Option<&str>) -> bool {
        match (self.target, bot_username) {
            (None, _) => true,
            (Some(target), Some(me)) => {
                target.eq_ignore_ascii_case(me.trim_start_matches('@'))
            }
            (Some(_), None) => false,
        }
    }
}

fn split_command(text: &str) -> Option<CommandText<'_>> {
    let body = text.strip_prefix('/')?;
    let (token, args) = match body.find(char::is_whitespace) {
        Some(pos) => (&body[..pos], body[pos..].trim()),
        None => (body, ""),
    };
    let (name, target) = match token.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (token, None),
    };
    if name.is_empty() {
        return None;
    }
    Some(CommandText {
        name: name.to_lowercase(),
        target,
        args,
    })
}

/// Split `/Name@bot rest` into `("name", "rest")`.
///
/// `None` for plain text and for commands addressed to a bot other than
/// `bot_username`.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<(String, String)> {
    let command = split_command(text)?;
    if !command.is_for(bot_username) {
        return None;
    }
    Some((command.name, command.args.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ME: Option<&str> = Some("rank_gate_bot");

    #[test]
    fn parses_command_with_bot_suffix_and_args() {
        assert_eq!(
            parse_command("/setrank@rank_gate_bot 42 admin", ME),
            Some(("setrank".to_string(), "42 admin".to_string()))
        );
        assert_eq!(parse_command("/start", ME), Some(("start".to_string(), String::new())));
        assert_eq!(
            parse_command("/start@Rank_Gate_Bot", ME),
            Some(("start".to_string(), String::new()))
        );
    }

    #[test]
    fn commands_for_other_bots_are_ignored() {
        assert_eq!(parse_command("/start@OtherBot", ME), None);
        assert_eq!(parse_command("/setrank@OtherBot 42 admin", ME), None);
        // without a known username, only unaddressed commands are ours
        assert_eq!(parse_command("/start@rank_gate_bot", None), None);
        assert_eq!(parse_command("/start", None), Some(("start".to_string(), String::new())));
    }

    #[test]
    fn command_token_is_lowercased() {
        assert_eq!(
            parse_command("/START now", ME),
            Some(("start".to_string(), "now".to_string()))
        );
        assert_eq!(parse_command("/SetRank@rank_gate_bot 1 admin", ME).unwrap().0, "setrank");
    }

    #[test]
    fn plain_text_and_bare_slash_are_not_commands() {
        assert_eq!(parse_command("hello /start", ME), None);
        assert_eq!(parse_command("/", ME), None);
        assert_eq!(parse_command("/ start", ME), None);
        assert_eq!(parse_command("/@rank_gate_bot", ME), None);
    }

    #[test]
    fn from_text_classifies_payload() {
        let event = InboundEvent::from_text(None, None, "/help me", ME).unwrap();
        assert_eq!(event.category(), Category::Command);
        assert_eq!(event.routing_key(), "help");
        assert_eq!(event.text(), "me");

        let event = InboundEvent::from_text(None, None, "abc", ME).unwrap();
        assert_eq!(event.category(), Category::TextMessage);
        assert_eq!(event.routing_key(), "abc");
    }

    #[test]
    fn from_text_drops_commands_for_other_bots() {
        // must not fall through to free text either
        assert!(InboundEvent::from_text(None, None, "/start@OtherBot", ME).is_none());
    }

    #[test]
    fn display_name_joins_last_name() {
        let actor = Actor {
            id: 1,
            handle: None,
            first_name: "Ada".into(),
            last_name: Some("Lovelace".into()),
        };
        assert_eq!(actor.display_name(), "Ada Lovelace");
        assert_eq!(actor.label(), "1");
    }
}
