//! Remote endpoint contract for the external messaging application.
//!
//! The session bus binding itself (connection setup, marshaling) lives
//! outside this workspace; everything here depends only on the
//! [`TransportClient`] trait and the strongly-typed [`Signal`] enum.
//! Positional payload decoding happens once, in `signal.rs`, and never
//! inside session or directory logic.

pub mod client;
pub mod contact;
pub mod signal;

pub use {
    client::{TransportClient, TransportError},
    contact::{ContactInfo, ContactRecord, PhotoPayload},
    signal::{Signal, decode_signal},
};
