use std::{collections::HashMap, sync::Arc};

use {tokio::sync::RwLock, tracing::debug};

use {chatbridge_avatars::AvatarCache, chatbridge_transport::TransportClient};

use crate::{
    session::{ChatSession, SessionConfig, SessionShared},
    sink::NotificationSink,
};

/// Peer jid → live session. Sessions hold a weak handle back to this map
/// so destroy can remove its own entry.
pub(crate) type SessionMap = RwLock<HashMap<String, Arc<ChatSession>>>;

/// Exclusive owner of all live [`ChatSession`]s, keyed by bare peer jid.
///
/// At most one session exists per peer at a time; `lookup_or_create` is
/// the only creation path and destroy is the only removal path.
pub struct SessionRegistry {
    shared: Arc<SessionShared>,
    map: Arc<SessionMap>,
}

impl SessionRegistry {
    pub fn new(
        transport: Arc<dyn TransportClient>,
        sink: Arc<dyn NotificationSink>,
        avatars: Arc<AvatarCache>,
        config: SessionConfig,
    ) -> Self {
        Self {
            shared: Arc::new(SessionShared {
                transport,
                sink,
                avatars,
                config,
            }),
            map: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Return the live session for the sender's bare jid, replaying the
    /// message into it through its normal inbound path, or create a new
    /// session bootstrapping around this initial message.
    pub async fn lookup_or_create(
        &self,
        account_id: &str,
        sender: &str,
        initial_message: &str,
        avatar_hint: Option<String>,
    ) -> Arc<ChatSession> {
        // One write lock across lookup and insert: concurrent callers for
        // the same peer must never both miss and both create.
        let existing = {
            let mut map = self.map.write().await;
            let peer_id = chatbridge_common::bare_jid(sender).to_string();
            match map.get(&peer_id).cloned() {
                Some(existing) => existing,
                None => {
                    debug!(peer = %peer_id, account = %account_id, "creating session");
                    let session = ChatSession::spawn(
                        Arc::clone(&self.shared),
                        account_id,
                        sender,
                        Some(initial_message.to_string()),
                        avatar_hint,
                        Arc::downgrade(&self.map),
                    );
                    map.insert(peer_id, Arc::clone(&session));
                    return session;
                },
            }
        };
        // Replay outside the lock; the handler only touches session state.
        existing.handle_new_message(sender, initial_message).await;
        existing
    }

    /// Explicitly initiate a session toward a peer (no triggering message).
    /// Idempotent like [`Self::lookup_or_create`].
    pub async fn initiate(&self, account_id: &str, peer: &str) -> Arc<ChatSession> {
        let mut map = self.map.write().await;
        let peer_id = chatbridge_common::bare_jid(peer).to_string();
        if let Some(existing) = map.get(&peer_id).cloned() {
            return existing;
        }
        let session = ChatSession::spawn(
            Arc::clone(&self.shared),
            account_id,
            peer,
            None,
            None,
            Arc::downgrade(&self.map),
        );
        map.insert(peer_id, Arc::clone(&session));
        session
    }

    pub async fn get(&self, peer: &str) -> Option<Arc<ChatSession>> {
        self.map
            .read()
            .await
            .get(chatbridge_common::bare_jid(peer))
            .cloned()
    }

    pub async fn sessions(&self) -> Vec<Arc<ChatSession>> {
        self.map.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.map.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.map.read().await.is_empty()
    }

    /// Destroy every live session and clear the map. Called on shutdown
    /// and on connection loss so no handler outlives the registry.
    pub async fn destroy_all(&self) {
        let all: Vec<_> = self.map.write().await.drain().map(|(_, s)| s).collect();
        for session in all {
            session.destroy().await;
        }
    }
}
