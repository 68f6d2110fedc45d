//! In-memory transport and sink fakes shared by the session and registry
//! tests.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use {
    anyhow::{Result, anyhow},
    async_trait::async_trait,
    serde_json::Value,
    tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};

use chatbridge_transport::{ContactInfo, ContactRecord, Signal, TransportClient};

use crate::{
    session::ChatSession,
    sink::{NotificationSink, SessionView},
};

#[derive(Default)]
pub(crate) struct FakeTransport {
    /// account → roster
    pub rosters: Mutex<HashMap<String, Vec<ContactRecord>>>,
    /// jid → vcard map
    pub infos: Mutex<HashMap<String, Value>>,
    /// account → string properties
    pub accounts: Mutex<HashMap<String, HashMap<String, String>>>,
    /// recorded (peer, text, key_id, account) sends
    pub sent: Mutex<Vec<(String, String, String, String)>>,
    /// recorded (peer, account) open_chat calls
    pub opened: Mutex<Vec<(String, String)>>,
    pub fail_contact_info: AtomicBool,
    signal_txs: Mutex<Vec<UnboundedSender<Signal>>>,
}

impl FakeTransport {
    pub fn with_roster(self, account: &str, contacts: &[(&str, &str)]) -> Self {
        let roster = contacts
            .iter()
            .map(|(jid, show)| ContactRecord {
                jid: jid.to_string(),
                name: None,
                show: Some(show.to_string()),
            })
            .collect();
        self.rosters
            .lock()
            .unwrap()
            .insert(account.to_string(), roster);
        self
    }

    pub fn with_info(self, jid: &str, info: Value) -> Self {
        self.infos.lock().unwrap().insert(jid.to_string(), info);
        self
    }

    pub fn with_account(self, account: &str, own_jid: &str) -> Self {
        self.accounts.lock().unwrap().insert(
            account.to_string(),
            HashMap::from([("jid".to_string(), own_jid.to_string())]),
        );
        self
    }

    pub fn emit(&self, signal: Signal) {
        for tx in self.signal_txs.lock().unwrap().iter() {
            let _ = tx.send(signal.clone());
        }
    }
}

#[async_trait]
impl TransportClient for FakeTransport {
    async fn send_chat_message(
        &self,
        peer: &str,
        text: &str,
        key_id: &str,
        account: &str,
    ) -> Result<bool> {
        self.sent.lock().unwrap().push((
            peer.to_string(),
            text.to_string(),
            key_id.to_string(),
            account.to_string(),
        ));
        Ok(true)
    }

    async fn contact_info(&self, jid: &str) -> Result<ContactInfo> {
        if self.fail_contact_info.load(Ordering::SeqCst) {
            return Err(anyhow!("contact_info unavailable"));
        }
        let info = self.infos.lock().unwrap().get(jid).cloned();
        match info {
            Some(Value::Object(map)) => Ok(ContactInfo(map)),
            _ => Ok(ContactInfo::default()),
        }
    }

    async fn account_info(&self, account: &str) -> Result<HashMap<String, String>> {
        self.accounts
            .lock()
            .unwrap()
            .get(account)
            .cloned()
            .ok_or_else(|| anyhow!("unknown account {account}"))
    }

    async fn list_contacts(&self, account: &str) -> Result<Vec<ContactRecord>> {
        Ok(self
            .rosters
            .lock()
            .unwrap()
            .get(account)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_accounts(&self) -> Result<Vec<String>> {
        let mut names: Vec<_> = self.rosters.lock().unwrap().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn open_chat(&self, peer: &str, account: &str, _message: &str) -> Result<bool> {
        self.opened
            .lock()
            .unwrap()
            .push((peer.to_string(), account.to_string()));
        Ok(true)
    }

    fn signals(&self) -> UnboundedReceiver<Signal> {
        let (tx, rx) = unbounded_channel();
        self.signal_txs.lock().unwrap().push(tx);
        rx
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    pub registered: Mutex<Vec<SessionView>>,
    pub updates: Mutex<Vec<SessionView>>,
    pub notifies: Mutex<Vec<SessionView>>,
    pub expanded: AtomicBool,
}

impl RecordingSink {
    pub fn notify_count(&self) -> usize {
        self.notifies.lock().unwrap().len()
    }

    pub fn last_notify(&self) -> Option<SessionView> {
        self.notifies.lock().unwrap().last().cloned()
    }

    pub fn last_update(&self) -> Option<SessionView> {
        self.updates.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn register(&self, view: SessionView) {
        self.registered.lock().unwrap().push(view);
    }

    async fn update(&self, view: SessionView) {
        self.updates.lock().unwrap().push(view);
    }

    async fn notify(&self, view: SessionView) {
        self.notifies.lock().unwrap().push(view);
    }

    async fn is_expanded(&self, _peer_id: &str) -> bool {
        self.expanded.load(Ordering::SeqCst)
    }
}

/// Spin until the session's displayable bootstrap chain has finished.
pub(crate) async fn wait_populated(session: &ChatSession) {
    while !session.is_populated().await {
        tokio::task::yield_now().await;
    }
}

/// Spin until `pred` holds. The fakes resolve without real I/O, so a few
/// scheduler passes always suffice.
pub(crate) async fn wait_for<F, Fut>(mut pred: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    while !pred().await {
        tokio::task::yield_now().await;
    }
}
