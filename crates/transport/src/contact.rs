use {
    anyhow::{Context, Result},
    base64::{Engine, engine::general_purpose::STANDARD as BASE64},
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

use chatbridge_common::Presence;

/// One roster entry from `list_contacts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub jid: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Raw presence `show` value, when the roster carries one.
    #[serde(default)]
    pub show: Option<String>,
}

impl ContactRecord {
    pub fn presence(&self) -> Presence {
        self.show
            .as_deref()
            .map(Presence::from_show)
            .unwrap_or(Presence::Unknown)
    }
}

/// Inline avatar payload from a contact's vcard photo field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoPayload {
    pub mime_type: String,
    /// Content hash advertised by the remote side, when present.
    pub sha: Option<String>,
    data_b64: String,
}

impl PhotoPayload {
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.data_b64.trim())
            .context("invalid base64 in photo payload")
    }
}

/// Loosely-typed vcard map returned by `contact_info`.
///
/// Field accessors encapsulate the remote application's key conventions
/// so callers never index into the raw map.
#[derive(Debug, Clone, Default)]
pub struct ContactInfo(pub Map<String, Value>);

impl ContactInfo {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn jid(&self) -> Option<&str> {
        self.str_field("jid")
    }

    /// Resolution order: FN, then NICKNAME, then the bare jid.
    pub fn display_name(&self) -> Option<&str> {
        self.str_field("FN")
            .or_else(|| self.str_field("NICKNAME"))
            .or_else(|| self.jid())
    }

    pub fn photo(&self) -> Option<PhotoPayload> {
        let photo = self.0.get("PHOTO")?.as_object()?;
        let mime_type = photo.get("TYPE")?.as_str()?.to_string();
        let data_b64 = photo.get("BINVAL")?.as_str()?.to_string();
        let sha = photo.get("SHA").and_then(Value::as_str).map(str::to_string);
        Some(PhotoPayload {
            mime_type,
            sha,
            data_b64,
        })
    }
}
