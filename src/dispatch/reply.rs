use async_trait::async_trait;

/// One result row for an inline query answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineArticle {
    pub id: String,
    pub title: String,
    pub description: String,
    pub message_text: String,
}

/// Outbound channel back to wherever the event came from.
///
/// Handlers get one per event. The core only uses `send_text` for scope and
/// denial notices.
#[async_trait]
pub trait Reply: Send + Sync {
    async fn send_text(&self, text: &str) -> anyhow::Result<()>;

    /// Text with one row of callback buttons, given as `(label, token)`.
    async fn send_buttons(&self, text: &str, buttons: &[(String, String)]) -> anyhow::Result<()>;

    async fn answer_inline(&self, results: Vec<InlineArticle>) -> anyhow::Result<()>;

    async fn answer_callback(&self, text: Option<&str>) -> anyhow::Result<()>;
}
