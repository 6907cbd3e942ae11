//! Client-held session token.
//!
//! The client keeps exactly one token under a fixed key. Writers race
//! last-write-wins; there is no merge.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tempfile::NamedTempFile;

/// Fixed storage key for the session token.
pub const SESSION_KEY: &str = "token";

/// Error raised by a session store.
#[derive(Debug)]
pub enum SessionError {
    /// Reading or writing durable storage failed.
    Io(std::io::Error),
    /// The in-memory cell was poisoned by a panicking writer.
    LockPoisoned,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "session storage error: {e}"),
            Self::LockPoisoned => write!(f, "session lock poisoned"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::LockPoisoned => None,
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Process-wide client session cell.
///
/// Route guards and request decorators take this by reference so tests can
/// hand them a fake.
pub trait SessionStore: Send + Sync {
    /// The current token, if any.
    fn get(&self) -> Result<Option<String>, SessionError>;

    /// Replace the current token.
    fn set(&self, token: &str) -> Result<(), SessionError>;

    /// Forget the current token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Session held in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Result<Option<String>, SessionError> {
        let token = self.token.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(token.clone())
    }

    fn set(&self, token: &str) -> Result<(), SessionError> {
        let mut cell = self.token.write().map_err(|_| SessionError::LockPoisoned)?;
        *cell = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut cell = self.token.write().map_err(|_| SessionError::LockPoisoned)?;
        *cell = None;
        Ok(())
    }
}

/// Session persisted as a single file named [`SESSION_KEY`] in a directory.
///
/// Survives process restarts, like browser local storage. The file is readable
/// by its owner only, and the token is stored byte for byte.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store the session under `directory`. The directory must exist.
    #[must_use]
    pub fn new(directory: &Path) -> Self {
        Self {
            path: directory.join(SESSION_KEY),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Result<Option<String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok((!contents.is_empty()).then_some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, token: &str) -> Result<(), SessionError> {
        // Each writer stages in its own owner-only temp file, then renames it
        // into place, so readers never observe a half-written token.
        let directory = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut staging = NamedTempFile::new_in(directory)?;
        staging.write_all(token.as_bytes())?;
        staging.as_file().sync_all()?;
        staging
            .persist(&self.path)
            .map_err(|e| SessionError::Io(e.error))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
