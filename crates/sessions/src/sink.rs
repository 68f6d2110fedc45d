use async_trait::async_trait;

use chatbridge_common::Message;

/// Presentable snapshot of one session, handed to the notification sink.
#[derive(Debug, Clone)]
pub struct SessionView {
    /// Bare peer jid; stable identity of the banner.
    pub peer_id: String,
    pub title: String,
    /// Avatar reference into the cache, when resolved.
    pub icon_uri: Option<String>,
    /// Secondary (presence) icon name.
    pub presence_icon: String,
    /// Full message log in arrival order.
    pub messages: Vec<Message>,
    pub unseen_count: u32,
    pub urgent: bool,
}

/// Capability interface to the host's notification surface.
///
/// Sessions depend on this trait, never on a concrete presentation type.
/// `register` is called once when a session becomes displayable, `update`
/// on silent state changes (presence, flush, sent echoes), and `notify`
/// when a debounced burst of inbound messages should surface a banner.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn register(&self, view: SessionView);
    async fn update(&self, view: SessionView);
    async fn notify(&self, view: SessionView);

    /// Whether the presentation surface for this session is currently
    /// expanded. Expanded sessions do not accumulate unseen counts.
    async fn is_expanded(&self, peer_id: &str) -> bool;
}
