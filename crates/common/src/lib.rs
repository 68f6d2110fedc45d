//! Shared conversation types: messages, presence, peer identifiers.
//!
//! Everything here is plain data — no I/O, no runtime. The transport,
//! session, and directory crates all build on these types.

pub mod jid;
pub mod message;
pub mod presence;

pub use {
    jid::bare_jid,
    message::{Direction, Message, MessageKind},
    presence::Presence,
};
