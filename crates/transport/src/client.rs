use std::collections::HashMap;

use {
    anyhow::Result,
    async_trait::async_trait,
    thiserror::Error,
    tokio::sync::mpsc::UnboundedReceiver,
};

use crate::{
    contact::{ContactInfo, ContactRecord},
    signal::Signal,
};

/// Transport-level failure taxonomy.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A remote method call returned an error.
    #[error("remote call '{method}' failed: {message}")]
    Call { method: String, message: String },

    /// A signal payload did not match the expected positional shape.
    #[error("malformed payload for signal '{signal}'")]
    Decode { signal: String },

    /// The remote endpoint disappeared from the bus.
    #[error("connection to the remote endpoint lost")]
    ConnectionLost,
}

/// Client side of the remote application's RPC interface.
///
/// Implementations issue every call asynchronously and deliver signals
/// through the receiver returned by [`TransportClient::signals`], already
/// decoded into [`Signal`] values, in bus delivery order.
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Send a chat message. `key_id` is empty for unencrypted sends.
    async fn send_chat_message(
        &self,
        peer: &str,
        text: &str,
        key_id: &str,
        account: &str,
    ) -> Result<bool>;

    /// Fetch the vcard-style info map for a contact.
    async fn contact_info(&self, jid: &str) -> Result<ContactInfo>;

    /// Fetch string properties of an account (notably its own `jid`).
    async fn account_info(&self, account: &str) -> Result<HashMap<String, String>>;

    /// Fetch the roster for an account.
    async fn list_contacts(&self, account: &str) -> Result<Vec<ContactRecord>>;

    /// List configured account names.
    async fn list_accounts(&self) -> Result<Vec<String>>;

    /// Ask the external application to open a chat window for `peer`.
    async fn open_chat(&self, peer: &str, account: &str, message: &str) -> Result<bool>;

    /// Subscribe to the decoded signal stream. Each call yields an
    /// independent subscription.
    fn signals(&self) -> UnboundedReceiver<Signal>;
}
