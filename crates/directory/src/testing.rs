//! Transport fake shared by the directory and search tests.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use {
    anyhow::Result,
    async_trait::async_trait,
    base64::{Engine, engine::general_purpose::STANDARD as BASE64},
    serde_json::json,
    tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel},
};

use {
    chatbridge_avatars::AvatarCache,
    chatbridge_transport::{ContactInfo, ContactRecord, Signal, TransportClient},
};

pub(crate) fn fake_avatars() -> (tempfile::TempDir, Arc<AvatarCache>) {
    let dir = tempfile::tempdir().unwrap();
    let avatars = Arc::new(AvatarCache::new(dir.path().join("avatars")));
    avatars.open().unwrap();
    (dir, avatars)
}

#[derive(Default)]
pub(crate) struct FakeTransport {
    /// account → roster
    rosters: Mutex<HashMap<String, Vec<ContactRecord>>>,
    /// jid → photo (mime, sha, bytes)
    photos: Mutex<HashMap<String, (String, String, Vec<u8>)>>,
    pub opened: Mutex<Vec<(String, String)>>,
    contact_info_calls: AtomicUsize,
}

impl FakeTransport {
    pub fn with_contact(self, account: &str, jid: &str, name: Option<&str>) -> Self {
        self.add_contact(account, jid, name);
        self
    }

    pub fn add_contact(&self, account: &str, jid: &str, name: Option<&str>) {
        self.rosters
            .lock()
            .unwrap()
            .entry(account.to_string())
            .or_default()
            .push(ContactRecord {
                jid: jid.to_string(),
                name: name.map(str::to_string),
                show: None,
            });
    }

    pub fn set_photo(&self, jid: &str, mime: &str, sha: &str, bytes: &[u8]) {
        self.photos.lock().unwrap().insert(
            jid.to_string(),
            (mime.to_string(), sha.to_string(), bytes.to_vec()),
        );
    }

    pub fn contact_info_calls(&self) -> usize {
        self.contact_info_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransportClient for FakeTransport {
    async fn send_chat_message(
        &self,
        _peer: &str,
        _text: &str,
        _key_id: &str,
        _account: &str,
    ) -> Result<bool> {
        Ok(true)
    }

    async fn contact_info(&self, jid: &str) -> Result<ContactInfo> {
        self.contact_info_calls.fetch_add(1, Ordering::SeqCst);
        let photo = self.photos.lock().unwrap().get(jid).cloned();
        let value = match photo {
            Some((mime, sha, bytes)) => json!({
                "jid": jid,
                "PHOTO": {"TYPE": mime, "SHA": sha, "BINVAL": BASE64.encode(bytes)},
            }),
            None => json!({"jid": jid}),
        };
        match value {
            serde_json::Value::Object(map) => Ok(ContactInfo(map)),
            _ => Ok(ContactInfo::default()),
        }
    }

    async fn account_info(&self, _account: &str) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
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
        let (_tx, rx) = unbounded_channel();
        rx
    }
}
