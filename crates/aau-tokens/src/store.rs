//! File-backed token cache.
//!
//! Each cache file holds a single token on its first line. A valid file is
//! authoritative and never rewritten; a missing, unreadable, or malformed
//! file is treated as absent and replaced by the next successful write.
//!
//! There is no locking. Two processes starting at the same moment may both
//! generate a value; the last write lands on disk, while each process keeps
//! using the value it generated. Later invocations converge on whatever
//! valid entry is durable.
//!
//! I/O failures degrade the token to ephemeral and are logged, never
//! returned, unless [`DebugFlags::raise`] is set.

use std::io;
use std::path::{Path, PathBuf};

use aau_core::DebugFlags;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::errors::TokenError;
use crate::generator::TokenGenerator;
use crate::kind::{Token, TokenKind};

/// A write postponed until its directory exists.
#[derive(Clone, Debug)]
struct DeferredWrite {
    must_exist: PathBuf,
    path: PathBuf,
    value: String,
    kind: TokenKind,
}

/// Read-validate-or-generate-and-persist cache for token files.
#[derive(Debug)]
pub struct TokenStore {
    generator: TokenGenerator,
    flags: DebugFlags,
    deferred: Mutex<Vec<DeferredWrite>>,
}

impl TokenStore {
    /// Create a store that generates with `generator` and honors `flags`.
    pub fn new(generator: TokenGenerator, flags: DebugFlags) -> Self {
        Self {
            generator,
            flags,
            deferred: Mutex::new(Vec::new()),
        }
    }

    /// Return the token cached at `path`, generating and saving one if needed.
    pub fn get_or_create(&self, path: &Path, kind: TokenKind) -> Result<String, TokenError> {
        self.load_or_create(path, kind, None).map(|t| t.value)
    }

    /// Like [`get_or_create`](Self::get_or_create), returning the full [`Token`].
    ///
    /// When `must_exist` is given and that directory does not exist yet, the
    /// write is deferred until [`flush_deferred`](Self::flush_deferred) (or drop)
    /// instead of creating it. This keeps a half-created environment from
    /// looking non-empty.
    pub fn load_or_create(
        &self,
        path: &Path,
        kind: TokenKind,
        must_exist: Option<&Path>,
    ) -> Result<Token, TokenError> {
        if let Some(value) = self.deferred_value(path, kind) {
            debug!(%kind, value = %value, "returning deferred token");
            return Ok(Token::ephemeral(kind, value));
        }

        debug!(%kind, path = %path.display(), "token path");
        match self.read_token(path, kind) {
            Ok(Some(value)) => return Ok(Token::persisted(kind, value)),
            Ok(None) => {}
            Err(e) if self.flags.raise => return Err(e),
            Err(e) => warn!(%kind, error = %e, "unexpected error reading token"),
        }

        let value = self.generator.generate()?;
        debug!(%kind, value = %value, "generated token");

        if let Some(dir) = must_exist {
            if !dir.exists() {
                debug!(%kind, dir = %dir.display(), "directory not ready, deferring token write");
                self.deferred.lock().push(DeferredWrite {
                    must_exist: dir.to_path_buf(),
                    path: path.to_path_buf(),
                    value: value.clone(),
                    kind,
                });
                return Ok(Token::ephemeral(kind, value));
            }
        }

        match self.write_token(path, &value, kind) {
            Ok(()) => Ok(Token::persisted(kind, value)),
            Err(e) if self.flags.raise => Err(e),
            Err(e) => {
                if e.is_permission() {
                    debug!(%kind, "no write permissions; token is ephemeral");
                } else {
                    warn!(%kind, error = %e, "unexpected error writing token");
                }
                Ok(Token::ephemeral(kind, value))
            }
        }
    }

    /// Return the token at `path` if it exists and is valid. Never generates.
    ///
    /// Read errors are logged and treated as absent unless
    /// [`DebugFlags::raise`] is set.
    pub fn read_only(&self, path: &Path, kind: TokenKind) -> Result<Option<String>, TokenError> {
        match self.read_token(path, kind) {
            Ok(value) => Ok(value),
            Err(e) if self.flags.raise => Err(e),
            Err(e) => {
                if e.is_permission() {
                    debug!(%kind, path = %path.display(), "no read permissions; skipping token");
                } else {
                    warn!(%kind, error = %e, "unexpected error reading token");
                }
                Ok(None)
            }
        }
    }

    /// Attempt every deferred write whose directory now exists.
    ///
    /// Returns the number of tokens written. Writes that still cannot happen
    /// stay queued; failed writes are dropped.
    pub fn flush_deferred(&self) -> usize {
        let pending = std::mem::take(&mut *self.deferred.lock());
        let mut written = 0;
        let mut still_pending = Vec::new();
        for write in pending {
            if !write.must_exist.exists() {
                still_pending.push(write);
                continue;
            }
            match self.write_token(&write.path, &write.value, write.kind) {
                Ok(()) => written += 1,
                Err(e) => debug!(kind = %write.kind, error = %e, "deferred token write failed"),
            }
        }
        self.deferred.lock().extend(still_pending);
        written
    }

    /// Number of writes currently deferred.
    pub fn deferred_count(&self) -> usize {
        self.deferred.lock().len()
    }

    fn deferred_value(&self, path: &Path, kind: TokenKind) -> Option<String> {
        self.deferred
            .lock()
            .iter()
            .find(|w| w.path == path && w.kind == kind)
            .map(|w| w.value.clone())
    }

    /// `Ok(None)` means absent or malformed; `Err` means the file exists but
    /// could not be read.
    fn read_token(&self, path: &Path, kind: TokenKind) -> Result<Option<String>, TokenError> {
        if self.flags.read_fails(kind.letter()) {
            debug!(%kind, "pretending token is not present");
            return Ok(None);
        }
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TokenError::persistence(path, e)),
        };
        let Ok(content) = String::from_utf8(bytes) else {
            debug!(%kind, path = %path.display(), "cached token is not text, treating as absent");
            return Ok(None);
        };
        let value = content.lines().next().unwrap_or_default().trim();
        if kind.is_valid(value) {
            debug!(%kind, value = %value, "retrieved token");
            Ok(Some(value.to_string()))
        } else {
            debug!(%kind, path = %path.display(), "cached token is malformed, treating as absent");
            Ok(None)
        }
    }

    fn write_token(&self, path: &Path, value: &str, kind: TokenKind) -> Result<(), TokenError> {
        if self.flags.write_fails(kind.letter()) {
            return Err(TokenError::persistence(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "simulated write failure"),
            ));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TokenError::persistence(parent, e))?;
        }
        std::fs::write(path, value).map_err(|e| TokenError::persistence(path, e))?;
        debug!(%kind, path = %path.display(), "token saved");
        Ok(())
    }
}

impl Drop for TokenStore {
    fn drop(&mut self) {
        if self.deferred_count() > 0 {
            let _ = self.flush_deferred();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
