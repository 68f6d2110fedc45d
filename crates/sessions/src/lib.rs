//! Per-contact conversation sessions.
//!
//! A [`session::ChatSession`] is created on the first inbound message from an
//! unseen peer (or on explicit initiate), bootstraps itself from remote calls
//! without blocking event handling, buffers inbound messages behind a
//! notification debounce, and is destroyed on terminal signals. The
//! [`registry::SessionRegistry`] owns all live sessions, keyed by bare peer
//! jid. The presentation layer is reached only through the
//! [`sink::NotificationSink`] capability trait.

pub mod registry;
pub mod session;
pub mod sink;

#[cfg(test)]
mod testing;

pub use {
    registry::SessionRegistry,
    session::{ChatSession, SessionConfig},
    sink::{NotificationSink, SessionView},
};
