use std::sync::Arc;

use {anyhow::Result, async_trait::async_trait, tracing::debug};

use chatbridge_transport::TransportClient;

use crate::directory::ContactDirectory;

/// Metadata for one search result, as the host overlay renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMeta {
    /// Result id; the contact's jid.
    pub id: String,
    /// Display label, `"<name> (<jid>)"`.
    pub label: String,
    pub icon_uri: Option<String>,
}

/// Local session initiation hook. When configured, activating a search
/// result opens an in-process session instead of asking the external
/// application to open the chat.
#[async_trait]
pub trait ChatOpener: Send + Sync {
    async fn open(&self, account: &str, peer: &str) -> Result<()>;
}

/// Search-overlay provider backed by the [`ContactDirectory`].
///
/// Index results return immediately; avatar references resolve lazily in
/// `result_metadata` so the query path never blocks on remote calls.
pub struct ContactSearchProvider {
    directory: Arc<ContactDirectory>,
    transport: Arc<dyn TransportClient>,
    opener: Option<Arc<dyn ChatOpener>>,
}

impl ContactSearchProvider {
    pub fn new(
        directory: Arc<ContactDirectory>,
        transport: Arc<dyn TransportClient>,
        opener: Option<Arc<dyn ChatOpener>>,
    ) -> Self {
        Self {
            directory,
            transport,
            opener,
        }
    }

    /// Result ids for a fresh query.
    pub async fn initial_results(&self, query: &str) -> Vec<String> {
        self.directory
            .query(query)
            .await
            .into_iter()
            .map(|c| c.jid)
            .collect()
    }

    /// Narrow a previous result set with a refined query, keeping only
    /// ids that still match. No rescan of the full directory.
    pub async fn refine_results(&self, previous: &[String], query: &str) -> Vec<String> {
        let mut refined = Vec::with_capacity(previous.len());
        let query_lower = query.to_lowercase();
        for id in previous {
            let Some(contact) = self.directory.find(id).await else {
                continue;
            };
            if contact.jid.to_lowercase().contains(&query_lower)
                || contact.display_name.to_lowercase().contains(&query_lower)
            {
                refined.push(id.clone());
            }
        }
        refined
    }

    /// Resolve display metadata for a set of result ids. Unknown ids are
    /// skipped.
    pub async fn result_metadata(&self, ids: &[String]) -> Vec<ResultMeta> {
        let mut metas = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(contact) = self.directory.find(id).await else {
                continue;
            };
            let icon_uri = self.directory.resolve_avatar(&contact.jid).await;
            metas.push(ResultMeta {
                label: format!("{} ({})", contact.display_name, contact.jid),
                id: contact.jid,
                icon_uri,
            });
        }
        metas
    }

    /// Activate a result: open a local session when configured, otherwise
    /// hand off to the external application.
    pub async fn activate(&self, id: &str) -> Result<()> {
        let Some(contact) = self.directory.find(id).await else {
            anyhow::bail!("unknown search result '{id}'");
        };
        debug!(jid = %contact.jid, account = %contact.account, "activating search result");
        if let Some(opener) = &self.opener {
            opener.open(&contact.account, &contact.jid).await
        } else {
            self.transport
                .open_chat(&contact.jid, &contact.account, "")
                .await?;
            Ok(())
        }
    }
}
