use {serde_json::Value, tracing::debug};

use chatbridge_common::Presence;

/// A decoded asynchronous signal from the remote application.
///
/// One variant per signal name, with named fields. The positional wire
/// layout exists only inside [`decode_signal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    NewMessage {
        sender: String,
        text: String,
        account: String,
    },
    ChatState {
        jid: String,
        state: String,
    },
    MessageSent {
        recipient: String,
        text: String,
        chat_state: String,
    },
    ContactStatus {
        jid: String,
        presence: Presence,
    },
    ContactAbsence {
        jid: String,
        presence: Presence,
    },
    Subscribed {
        account: String,
        jid: String,
    },
    Unsubscribed {
        account: String,
        jid: String,
    },
    /// Synthesized by the bus binding when the remote endpoint disappears.
    ConnectionLost,
}

/// Positional payload shape shared by all signals: `[account, [fields...]]`.
struct Envelope<'a> {
    account: &'a str,
    inner: &'a [Value],
}

fn envelope(payload: &Value) -> Option<Envelope<'_>> {
    let outer = payload.as_array()?;
    let account = outer.first()?.as_str().unwrap_or("");
    let inner = outer.get(1)?.as_array()?;
    Some(Envelope { account, inner })
}

fn field(inner: &[Value], idx: usize) -> Option<String> {
    inner.get(idx)?.as_str().map(str::to_string)
}

/// String field that may legitimately be absent or null (e.g. the text of
/// a chat-state-only MessageSent). Decodes to the empty string.
fn optional_field(inner: &[Value], idx: usize) -> String {
    inner
        .get(idx)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// Decode one loosely-typed signal envelope into a [`Signal`].
///
/// This is the only place positional extraction happens. Malformed
/// payloads fail soft: the event is dropped with a debug log and `None`
/// is returned.
pub fn decode_signal(name: &str, payload: &Value) -> Option<Signal> {
    let decoded = match name {
        "NewMessage" => envelope(payload).and_then(|e| {
            Some(Signal::NewMessage {
                sender: field(e.inner, 0)?,
                text: optional_field(e.inner, 1),
                account: e.account.to_string(),
            })
        }),
        "ChatState" => envelope(payload).and_then(|e| {
            Some(Signal::ChatState {
                jid: field(e.inner, 0)?,
                // The state is the last positional field of the inner array.
                state: e.inner.last()?.as_str()?.to_string(),
            })
        }),
        "MessageSent" => envelope(payload).and_then(|e| {
            Some(Signal::MessageSent {
                recipient: field(e.inner, 0)?,
                text: optional_field(e.inner, 1),
                chat_state: optional_field(e.inner, 3),
            })
        }),
        "ContactStatus" => envelope(payload).and_then(|e| {
            Some(Signal::ContactStatus {
                jid: field(e.inner, 0)?,
                presence: Presence::from_show(&field(e.inner, 1)?),
            })
        }),
        "ContactAbsence" => envelope(payload).and_then(|e| {
            Some(Signal::ContactAbsence {
                jid: field(e.inner, 0)?,
                presence: Presence::from_show(&field(e.inner, 1)?),
            })
        }),
        "Subscribed" => envelope(payload).and_then(|e| {
            Some(Signal::Subscribed {
                account: e.account.to_string(),
                jid: field(e.inner, 0)?,
            })
        }),
        "Unsubscribed" => envelope(payload).and_then(|e| {
            Some(Signal::Unsubscribed {
                account: e.account.to_string(),
                jid: field(e.inner, 0)?,
            })
        }),
        _ => None,
    };

    if decoded.is_none() {
        debug!(signal = name, %payload, "dropping undecodable signal");
    }
    decoded
}
