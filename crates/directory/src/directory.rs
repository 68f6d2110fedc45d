use std::{collections::HashMap, sync::Arc};

use {
    anyhow::Result,
    tokio::sync::RwLock,
    tracing::{debug, warn},
};

use {chatbridge_avatars::AvatarCache, chatbridge_transport::TransportClient};

/// One searchable contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryContact {
    pub account: String,
    pub jid: String,
    pub display_name: String,
}

impl DirectoryContact {
    /// Case-insensitive substring match against jid and display name.
    fn matches(&self, term_lower: &str) -> bool {
        self.jid.to_lowercase().contains(term_lower)
            || self.display_name.to_lowercase().contains(term_lower)
    }
}

/// Contacts of one account. At most one entry exists per account name;
/// contacts are unique by jid within an entry.
#[derive(Debug, Clone)]
pub struct AccountEntry {
    pub account_name: String,
    pub contacts: Vec<DirectoryContact>,
}

#[derive(Default)]
struct DirectoryState {
    accounts: Vec<AccountEntry>,
    enabled: bool,
    /// Per-jid memo of resolved avatar references; `None` records a
    /// completed lookup that found no avatar.
    avatar_memo: HashMap<String, Option<String>>,
}

/// Incrementally-maintained contact list across all accounts.
pub struct ContactDirectory {
    transport: Arc<dyn TransportClient>,
    avatars: Arc<AvatarCache>,
    state: RwLock<DirectoryState>,
}

impl ContactDirectory {
    pub fn new(transport: Arc<dyn TransportClient>, avatars: Arc<AvatarCache>) -> Self {
        Self {
            transport,
            avatars,
            state: RwLock::new(DirectoryState::default()),
        }
    }

    /// Rebuild from scratch: fetch the account list, then each account's
    /// roster. A failing account is logged and skipped; the rest load.
    pub async fn reset(&self) -> Result<()> {
        {
            let mut st = self.state.write().await;
            *st = DirectoryState {
                enabled: true,
                ..DirectoryState::default()
            };
        }
        let accounts = self.transport.list_accounts().await?;
        for account in &accounts {
            if let Err(e) = self.fetch_account(account).await {
                warn!(account = %account, error = %e, "contact list fetch failed");
            }
        }
        debug!(accounts = accounts.len(), "contact directory loaded");
        Ok(())
    }

    /// Stop answering queries until the next reset.
    pub async fn disable(&self) {
        let mut st = self.state.write().await;
        *st = DirectoryState::default();
    }

    /// Fetch one account's roster fresh, replacing any stale entry.
    async fn fetch_account(&self, account: &str) -> Result<()> {
        let roster = self.transport.list_contacts(account).await?;
        let mut contacts: Vec<DirectoryContact> = Vec::with_capacity(roster.len());
        for record in roster {
            // Unique by jid within the entry.
            if contacts.iter().any(|c| c.jid == record.jid) {
                continue;
            }
            let display_name = record.name.clone().unwrap_or_else(|| record.jid.clone());
            contacts.push(DirectoryContact {
                account: account.to_string(),
                jid: record.jid,
                display_name,
            });
        }

        let mut st = self.state.write().await;
        st.accounts.retain(|e| e.account_name != account);
        st.accounts.push(AccountEntry {
            account_name: account.to_string(),
            contacts,
        });
        Ok(())
    }

    /// A subscription appeared: the stored entry for the account is stale,
    /// so drop it and re-fetch the whole roster.
    pub async fn on_subscribed(&self, account: &str, jid: &str) {
        debug!(account = %account, jid = %jid, "subscription added, refreshing account");
        if let Err(e) = self.fetch_account(account).await {
            warn!(account = %account, error = %e, "refresh after subscribe failed");
        }
    }

    /// A subscription went away: drop the contact from the account's
    /// entry. No-op if the jid is not present.
    pub async fn on_unsubscribed(&self, account: &str, jid: &str) {
        let mut st = self.state.write().await;
        if let Some(entry) = st.accounts.iter_mut().find(|e| e.account_name == account) {
            entry.contacts.retain(|c| c.jid != jid);
        }
    }

    /// Case-insensitive substring search across every account. Empty when
    /// no accounts are loaded or the directory is disabled.
    pub async fn query(&self, term: &str) -> Vec<DirectoryContact> {
        let term_lower = term.to_lowercase();
        let st = self.state.read().await;
        if !st.enabled {
            return Vec::new();
        }
        st.accounts
            .iter()
            .flat_map(|e| e.contacts.iter())
            .filter(|c| c.matches(&term_lower))
            .cloned()
            .collect()
    }

    /// Look a contact up by jid.
    pub async fn find(&self, jid: &str) -> Option<DirectoryContact> {
        let st = self.state.read().await;
        st.accounts
            .iter()
            .flat_map(|e| e.contacts.iter())
            .find(|c| c.jid == jid)
            .cloned()
    }

    /// Resolve a contact's avatar reference lazily, memoized per jid, so
    /// interactive search never repeats the detail fetch.
    pub async fn resolve_avatar(&self, jid: &str) -> Option<String> {
        if let Some(memo) = self.state.read().await.avatar_memo.get(jid) {
            return memo.clone();
        }
        let resolved = match self.transport.contact_info(jid).await {
            Ok(info) => info.photo().and_then(|photo| match photo.decode() {
                Ok(bytes) => {
                    Some(
                        self.avatars
                            .store(&photo.mime_type, photo.sha.as_deref(), &bytes),
                    )
                },
                Err(e) => {
                    warn!(jid = %jid, error = %e, "photo payload decode failed");
                    None
                },
            }),
            Err(e) => {
                warn!(jid = %jid, error = %e, "contact info fetch failed");
                None
            },
        };
        self.state
            .write()
            .await
            .avatar_memo
            .insert(jid.to_string(), resolved.clone());
        resolved
    }

    pub async fn account_count(&self) -> usize {
        self.state.read().await.accounts.len()
    }
}
