use std::{sync::Arc, time::Duration};

use {
    anyhow::Result,
    async_trait::async_trait,
    tokio::{sync::Mutex, task::AbortHandle},
    tracing::{debug, info, warn},
};

use {
    chatbridge_avatars::AvatarCache,
    chatbridge_config::ChatbridgeConfig,
    chatbridge_directory::{ChatOpener, ContactDirectory, ContactSearchProvider},
    chatbridge_sessions::{NotificationSink, SessionConfig, SessionRegistry},
    chatbridge_transport::{Signal, TransportClient},
};

/// Top-level, process-lifetime service.
///
/// Owns the transport connection and every downstream component, and runs
/// the single dispatch loop that feeds transport signals to sessions and
/// the contact directory. The host calls [`GatewayService::enable`] when
/// the component becomes active and [`GatewayService::disable`] when it is
/// torn down; connection loss triggers the same teardown internally and a
/// later `enable` rebuilds everything from scratch.
pub struct GatewayService {
    transport: Arc<dyn TransportClient>,
    avatars: Arc<AvatarCache>,
    registry: Arc<SessionRegistry>,
    directory: Arc<ContactDirectory>,
    search: Arc<ContactSearchProvider>,
    dispatch_task: Mutex<Option<AbortHandle>>,
}

impl GatewayService {
    pub fn new(
        transport: Arc<dyn TransportClient>,
        sink: Arc<dyn NotificationSink>,
        config: ChatbridgeConfig,
    ) -> Arc<Self> {
        let avatars = Arc::new(AvatarCache::new(config.avatars.resolved_cache_dir()));
        let registry = Arc::new(SessionRegistry::new(
            Arc::clone(&transport),
            sink,
            Arc::clone(&avatars),
            SessionConfig {
                debounce: Duration::from_millis(config.notifications.debounce_ms),
                urgent: config.notifications.urgent,
            },
        ));
        let directory = Arc::new(ContactDirectory::new(
            Arc::clone(&transport),
            Arc::clone(&avatars),
        ));
        let opener = config.search.local_chat.then(|| {
            Arc::new(RegistryOpener {
                registry: Arc::clone(&registry),
            }) as Arc<dyn ChatOpener>
        });
        let search = Arc::new(ContactSearchProvider::new(
            Arc::clone(&directory),
            Arc::clone(&transport),
            opener,
        ));
        Arc::new(Self {
            transport,
            avatars,
            registry,
            directory,
            search,
            dispatch_task: Mutex::new(None),
        })
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn directory(&self) -> &Arc<ContactDirectory> {
        &self.directory
    }

    pub fn search(&self) -> &Arc<ContactSearchProvider> {
        &self.search
    }

    /// Bring the service up: open the avatar cache, populate the contact
    /// directory, and start consuming the signal stream.
    ///
    /// Idempotent; calling `enable` on a running service is a no-op. Only
    /// the avatar cache is allowed to fail hard here: a directory that
    /// cannot be populated (remote endpoint not up yet) degrades to empty
    /// search results while notifications keep working.
    pub async fn enable(self: &Arc<Self>) -> Result<()> {
        let mut task = self.dispatch_task.lock().await;
        if task.is_some() {
            return Ok(());
        }

        self.avatars.open()?;
        if let Err(e) = self.directory.reset().await {
            warn!(error = %e, "contact directory unavailable; search disabled until reconnect");
        }

        let mut signals = self.transport.signals();
        let service = Arc::clone(self);
        let handle = tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                if !service.dispatch(signal).await {
                    break;
                }
            }
            debug!("dispatch loop ended");
        })
        .abort_handle();
        *task = Some(handle);
        info!("gateway enabled");
        Ok(())
    }

    /// Tear the service down: stop the dispatch loop, destroy every live
    /// session, and disable the directory. Idempotent.
    pub async fn disable(&self) {
        if let Some(handle) = self.dispatch_task.lock().await.take() {
            handle.abort();
        }
        self.registry.destroy_all().await;
        self.directory.disable().await;
        info!("gateway disabled");
    }

    /// Route one signal. Returns `false` when the loop should stop.
    ///
    /// All routing happens on this single task, so per-session handler
    /// order equals bus delivery order.
    async fn dispatch(self: &Arc<Self>, signal: Signal) -> bool {
        match signal {
            Signal::NewMessage {
                sender,
                text,
                account,
            } => {
                // Chat-state-only stanzas decode with empty text; nothing
                // to show.
                if !text.is_empty() {
                    self.registry
                        .lookup_or_create(&account, &sender, &text, None)
                        .await;
                }
            }
            Signal::ChatState { jid, state } => {
                if let Some(session) = self.registry.get(&jid).await {
                    session.handle_chat_state(&state).await;
                }
            }
            Signal::MessageSent {
                recipient,
                text,
                chat_state,
            } => {
                // Sessions filter on the recipient's bare jid themselves.
                for session in self.registry.sessions().await {
                    session
                        .handle_message_sent(&recipient, &text, &chat_state)
                        .await;
                }
            }
            Signal::ContactStatus { jid, presence } | Signal::ContactAbsence { jid, presence } => {
                for session in self.registry.sessions().await {
                    session.handle_presence(&jid, presence).await;
                }
            }
            Signal::Subscribed { account, jid } => {
                self.directory.on_subscribed(&account, &jid).await;
            }
            Signal::Unsubscribed { account, jid } => {
                self.directory.on_unsubscribed(&account, &jid).await;
            }
            Signal::ConnectionLost => {
                warn!("remote endpoint lost; tearing down");
                self.registry.destroy_all().await;
                self.directory.disable().await;
                self.dispatch_task.lock().await.take();
                return false;
            }
        }
        true
    }
}

/// [`ChatOpener`] over the in-process session registry, wired in when
/// `search.local_chat` is configured.
struct RegistryOpener {
    registry: Arc<SessionRegistry>,
}

#[async_trait]
impl ChatOpener for RegistryOpener {
    async fn open(&self, account: &str, peer: &str) -> Result<()> {
        self.registry.initiate(account, peer).await;
        Ok(())
    }
}
