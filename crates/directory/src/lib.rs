//! Cross-account contact directory and search surface.
//!
//! The directory is rebuilt from the remote application on reset and then
//! maintained incrementally from subscription signals. The search provider
//! answers host search-overlay queries against it.

pub mod directory;
pub mod search;

#[cfg(test)]
mod testing;

pub use {
    directory::{AccountEntry, ContactDirectory, DirectoryContact},
    search::{ChatOpener, ContactSearchProvider, ResultMeta},
};
