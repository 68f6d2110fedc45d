use std::{
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use {
    anyhow::Result,
    tokio::{
        sync::{Mutex, RwLock},
        task::AbortHandle,
    },
    tracing::{debug, warn},
};

use {
    chatbridge_avatars::AvatarCache,
    chatbridge_common::{Direction, Message, Presence, bare_jid},
    chatbridge_transport::TransportClient,
};

use crate::{
    registry::SessionMap,
    sink::{NotificationSink, SessionView},
};

/// Chat-state value that terminates a session.
const CHAT_STATE_GONE: &str = "gone";

/// Tunables shared by every session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quiet period before a burst of inbound messages produces one notify.
    pub debounce: Duration,
    /// Mark notifications urgent.
    pub urgent: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            urgent: true,
        }
    }
}

/// Dependencies shared by the registry and all of its sessions.
pub(crate) struct SessionShared {
    pub transport: Arc<dyn TransportClient>,
    pub sink: Arc<dyn NotificationSink>,
    pub avatars: Arc<AvatarCache>,
    pub config: SessionConfig,
}

/// The session's own side of the conversation, resolved once from the
/// owning account's contact info.
#[derive(Debug, Clone)]
struct SelfIdentity {
    jid: String,
    display_name: String,
}

#[derive(Default)]
struct SessionState {
    display_name: Option<String>,
    presence: Presence,
    avatar_uri: Option<String>,
    self_identity: Option<SelfIdentity>,
    pending_count: u32,
    message_log: Vec<Message>,
    /// Inbound messages that raced in before bootstrap completed; drained
    /// into the log right after the initial message so arrival order holds.
    backlog: Vec<Message>,
    /// Single-slot placeholder for suppressing an encrypted-handshake echo
    /// of the last outgoing message. Known limitation: two quick sends can
    /// misattribute the first echo (the slot holds only the latest text).
    last_unconfirmed_outgoing: Option<String>,
    /// Set once the displayable bootstrap chain has finished.
    populated: bool,
}

/// Per-contact conversation state machine.
///
/// Lifecycle: Bootstrapping → Active (populated) → Destroyed (terminal).
/// Construction spawns three independent remote-call chains; none blocks
/// the others or event handling, and each degrades gracefully on failure.
pub struct ChatSession {
    account_id: String,
    /// Bare peer jid; registry key.
    peer_id: String,
    /// Peer address as delivered, possibly with a resource suffix. Used as
    /// the wire target for sends and as the message sender string.
    peer_addr: String,
    initial_message: Option<String>,
    shared: Arc<SessionShared>,
    state: RwLock<SessionState>,
    destroyed: AtomicBool,
    bootstrap_tasks: Mutex<Vec<AbortHandle>>,
    debounce_task: Mutex<Option<AbortHandle>>,
    map: Weak<SessionMap>,
}

impl ChatSession {
    /// Construct a session and spawn its bootstrap chains. Must be called
    /// from within a tokio runtime.
    pub(crate) fn spawn(
        shared: Arc<SessionShared>,
        account_id: &str,
        peer: &str,
        initial_message: Option<String>,
        avatar_hint: Option<String>,
        map: Weak<SessionMap>,
    ) -> Arc<Self> {
        let session = Arc::new(Self {
            account_id: account_id.to_string(),
            peer_id: bare_jid(peer).to_string(),
            peer_addr: peer.to_string(),
            initial_message,
            shared,
            state: RwLock::new(SessionState {
                avatar_uri: avatar_hint,
                // Until the roster scan resolves, assume the peer is online:
                // they just messaged us.
                presence: Presence::Online,
                ..SessionState::default()
            }),
            destroyed: AtomicBool::new(false),
            bootstrap_tasks: Mutex::new(Vec::new()),
            debounce_task: Mutex::new(None),
            map,
        });

        let handles = vec![
            tokio::spawn({
                let s = Arc::clone(&session);
                async move { s.bootstrap_presence().await }
            })
            .abort_handle(),
            tokio::spawn({
                let s = Arc::clone(&session);
                async move { s.bootstrap_identity().await }
            })
            .abort_handle(),
            tokio::spawn({
                let s = Arc::clone(&session);
                async move { s.bootstrap_profile().await }
            })
            .abort_handle(),
        ];
        if let Ok(mut tasks) = session.bootstrap_tasks.try_lock() {
            *tasks = handles;
        }
        session
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub async fn is_populated(&self) -> bool {
        self.state.read().await.populated
    }

    pub async fn display_name(&self) -> Option<String> {
        self.state.read().await.display_name.clone()
    }

    pub async fn presence(&self) -> Presence {
        self.state.read().await.presence
    }

    pub async fn avatar_uri(&self) -> Option<String> {
        self.state.read().await.avatar_uri.clone()
    }

    pub async fn pending_count(&self) -> u32 {
        self.state.read().await.pending_count
    }

    pub async fn message_log(&self) -> Vec<Message> {
        self.state.read().await.message_log.clone()
    }

    // ── Bootstrap chains ────────────────────────────────────────────────────

    /// Chain 1: roster scan for the peer's presence.
    async fn bootstrap_presence(self: Arc<Self>) {
        let roster = match self.shared.transport.list_contacts(&self.account_id).await {
            Ok(roster) => roster,
            Err(e) => {
                warn!(account = %self.account_id, error = %e, "contact list fetch failed");
                return;
            },
        };
        let Some(record) = roster.iter().find(|r| r.jid == self.peer_id) else {
            return;
        };
        if self.is_destroyed() {
            return;
        }
        self.state.write().await.presence = record.presence();
    }

    /// Chain 2: resolve our own identity from the owning account.
    async fn bootstrap_identity(self: Arc<Self>) {
        let props = match self.shared.transport.account_info(&self.account_id).await {
            Ok(props) => props,
            Err(e) => {
                warn!(account = %self.account_id, error = %e, "account info fetch failed");
                return;
            },
        };
        let Some(my_jid) = props.get("jid").cloned() else {
            return;
        };
        let display_name = match self.shared.transport.contact_info(&my_jid).await {
            Ok(info) => info
                .display_name()
                .map(str::to_string)
                .unwrap_or_else(|| my_jid.clone()),
            Err(e) => {
                warn!(jid = %my_jid, error = %e, "own contact info fetch failed");
                my_jid.clone()
            },
        };
        if self.is_destroyed() {
            return;
        }
        self.state.write().await.self_identity = Some(SelfIdentity {
            jid: my_jid,
            display_name,
        });
    }

    /// Chain 3: resolve the peer's profile. Completion makes the session
    /// displayable: the initial message is appended, the session registers
    /// with the notification sink, and the first notify is issued.
    async fn bootstrap_profile(self: Arc<Self>) {
        let info = match self.shared.transport.contact_info(&self.peer_id).await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(peer = %self.peer_id, error = %e, "contact info fetch failed");
                None
            },
        };

        let mut display_name = None;
        let mut avatar_uri = None;
        if let Some(info) = &info {
            display_name = info.display_name().map(str::to_string);
            if let Some(photo) = info.photo() {
                match photo.decode() {
                    Ok(bytes) => {
                        avatar_uri = Some(self.shared.avatars.store(
                            &photo.mime_type,
                            photo.sha.as_deref(),
                            &bytes,
                        ));
                    },
                    Err(e) => {
                        warn!(peer = %self.peer_id, error = %e, "photo payload decode failed");
                    },
                }
            }
        }

        if self.is_destroyed() {
            return;
        }
        let expanded = self.shared.sink.is_expanded(&self.peer_id).await;
        let view = {
            let mut st = self.state.write().await;
            if display_name.is_some() {
                st.display_name = display_name;
            }
            if avatar_uri.is_some() {
                st.avatar_uri = avatar_uri;
            }

            if let Some(text) = &self.initial_message {
                let title = self.title_locked(&st);
                let message =
                    Message::wrapped(text, &self.peer_addr, &title, None, Direction::Received);
                Self::append_inbound(&mut st, message, expanded);
            }
            // Replay anything that raced in during bootstrap, in order.
            for message in std::mem::take(&mut st.backlog) {
                Self::append_inbound(&mut st, message, expanded);
            }
            st.populated = true;
            self.view_locked(&st)
        };

        self.shared.sink.register(view.clone()).await;
        // Explicitly-initiated sessions have nothing to show yet; don't
        // surface an empty banner.
        if !view.messages.is_empty() {
            self.shared.sink.notify(view).await;
        }
    }

    // ── Event handlers ──────────────────────────────────────────────────────

    /// Inbound message from the peer. Appends to the log and restarts the
    /// notification debounce; bursts coalesce into a single notify.
    pub async fn handle_new_message(self: &Arc<Self>, sender: &str, text: &str) {
        if self.is_destroyed() || text.is_empty() || bare_jid(sender) != self.peer_id {
            return;
        }
        let expanded = self.shared.sink.is_expanded(&self.peer_id).await;
        {
            let mut st = self.state.write().await;
            let title = self.title_locked(&st);
            let message = Message::wrapped(text, sender, &title, None, Direction::Received);
            if !st.populated {
                st.backlog.push(message);
                return;
            }
            Self::append_inbound(&mut st, message, expanded);
        }
        self.restart_debounce().await;
    }

    /// Echo of an outgoing message, including ones sent outside this
    /// system. A chat-state `gone` without matching text tears down.
    pub async fn handle_message_sent(&self, recipient: &str, text: &str, chat_state: &str) {
        if self.is_destroyed() {
            return;
        }
        if !text.is_empty() && bare_jid(recipient) == self.peer_id {
            let view = {
                let mut st = self.state.write().await;
                if let Some(expected) = st.last_unconfirmed_outgoing.take()
                    && expected != text
                {
                    // The echo is the encrypted transform of our last send;
                    // showing it would leak handshake gibberish into the log.
                    debug!(peer = %self.peer_id, "suppressing transformed echo of outgoing message");
                    return;
                }
                let (sender, alias) = match &st.self_identity {
                    Some(id) => (id.jid.clone(), id.display_name.clone()),
                    // Identity chain still outstanding; degrade to the account name.
                    None => (self.account_id.clone(), self.account_id.clone()),
                };
                let message = Message::wrapped(text, &sender, &alias, None, Direction::Sent);
                if !st.populated {
                    st.backlog.push(message);
                    return;
                }
                st.message_log.push(message);
                self.view_locked(&st)
            };
            self.shared.sink.update(view).await;
        } else if chat_state == CHAT_STATE_GONE {
            self.destroy().await;
        }
    }

    /// Transient chat-state change; `gone` terminates the session.
    pub async fn handle_chat_state(&self, state: &str) {
        if self.is_destroyed() {
            return;
        }
        if state == CHAT_STATE_GONE {
            self.destroy().await;
        }
    }

    /// Presence or absence change. Ignored until the peer's display name
    /// has resolved; absence events carry a presence and are treated
    /// identically.
    pub async fn handle_presence(&self, jid: &str, presence: Presence) {
        if self.is_destroyed() {
            return;
        }
        let view = {
            let mut st = self.state.write().await;
            if st.display_name.is_none() || bare_jid(jid) != self.peer_id {
                return;
            }
            st.presence = presence;
            self.view_locked(&st)
        };
        self.shared.sink.update(view).await;
    }

    /// Send a response to the peer on the owning account, unencrypted.
    pub async fn respond(&self, text: &str) -> Result<()> {
        self.state.write().await.last_unconfirmed_outgoing = Some(text.to_string());
        self.shared
            .transport
            .send_chat_message(&self.peer_addr, text, "", &self.account_id)
            .await?;
        Ok(())
    }

    /// The user viewed the session; reset the unseen count.
    pub async fn flush(&self) {
        let view = {
            let mut st = self.state.write().await;
            st.pending_count = 0;
            self.view_locked(&st)
        };
        self.shared.sink.update(view).await;
    }

    /// Tear down: cancel bootstrap chains and any pending debounce, and
    /// remove this session from the registry map. Idempotent; no handler
    /// runs after destroy begins.
    pub async fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        for handle in self.bootstrap_tasks.lock().await.drain(..) {
            handle.abort();
        }
        if let Some(handle) = self.debounce_task.lock().await.take() {
            handle.abort();
        }
        if let Some(map) = self.map.upgrade() {
            map.write().await.remove(&self.peer_id);
        }
        debug!(peer = %self.peer_id, "session destroyed");
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn append_inbound(st: &mut SessionState, message: Message, expanded: bool) {
        if !expanded {
            st.pending_count += 1;
        }
        st.message_log.push(message);
    }

    fn title_locked(&self, st: &SessionState) -> String {
        st.display_name
            .clone()
            .unwrap_or_else(|| self.peer_id.clone())
    }

    fn view_locked(&self, st: &SessionState) -> SessionView {
        SessionView {
            peer_id: self.peer_id.clone(),
            title: self.title_locked(st),
            icon_uri: st.avatar_uri.clone(),
            presence_icon: st.presence.icon_name().to_string(),
            messages: st.message_log.clone(),
            unseen_count: st.pending_count,
            urgent: self.shared.config.urgent,
        }
    }

    /// Restart the notify debounce: abort any pending timer and arm a new
    /// one. On fire, a single notify covers every message accumulated
    /// since the last one.
    async fn restart_debounce(self: &Arc<Self>) {
        let mut guard = self.debounce_task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }
        let session = Arc::clone(self);
        *guard = Some(
            tokio::spawn(async move {
                tokio::time::sleep(session.shared.config.debounce).await;
                if session.is_destroyed() {
                    return;
                }
                session.debounce_task.lock().await.take();
                let view = {
                    let st = session.state.read().await;
                    session.view_locked(&st)
                };
                session.shared.sink.notify(view).await;
            })
            .abort_handle(),
        );
    }
}
