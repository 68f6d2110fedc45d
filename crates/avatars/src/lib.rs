//! Content-addressed on-disk store for avatar images.
//!
//! Files are keyed by `(content hash, mime subtype)`. Identical hash means
//! identical bytes, so a key is written at most once; two near-simultaneous
//! first-writers both succeed harmlessly.

use std::{
    fs,
    path::{Path, PathBuf},
};

use {
    anyhow::{Context, Result},
    sha2::{Digest, Sha256},
    tracing::{debug, error},
};

pub struct AvatarCache {
    dir: PathBuf,
}

impl AvatarCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory if absent, with private permissions.
    /// Idempotent.
    pub fn open(&self) -> Result<()> {
        if self.dir.is_dir() {
            return Ok(());
        }
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder
            .create(&self.dir)
            .with_context(|| format!("creating avatar cache dir {}", self.dir.display()))?;
        debug!(dir = %self.dir.display(), "avatar cache directory created");
        Ok(())
    }

    /// Store avatar bytes, returning a `file://` URI for the cache entry.
    ///
    /// The filename is `<hash>.<subtype>`. When the remote side did not
    /// advertise a hash, one is computed from the bytes. An existing file
    /// is never rewritten. A failed write is logged and the URI is still
    /// returned; the caller treats it like a cache hit.
    pub fn store(&self, mime_type: &str, content_hash: Option<&str>, bytes: &[u8]) -> String {
        let hash = match content_hash {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => {
                let digest = Sha256::digest(bytes);
                format!("{digest:x}")
            },
        };
        let ext = mime_type.split('/').nth(1).unwrap_or("img");
        let path = self.dir.join(format!("{hash}.{ext}"));
        let uri = format!("file://{}", path.display());

        if path.exists() {
            return uri;
        }
        if let Err(e) = fs::write(&path, bytes) {
            error!(path = %path.display(), error = %e, "failed to cache avatar data");
        }
        uri
    }
}
