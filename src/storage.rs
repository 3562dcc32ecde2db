// partially (c) 2016 Google Inc. (Lewin Bormann, lewinb@google.com)
//
// See project root for licensing information.
//

use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::types::TokenInfo;

/// Implements a specialized storage to set and retrieve the cached `TokenInfo`.
///
/// A storage holds at most one credential. It is trusted as is: no expiry or
/// signature check happens on the way out.
pub trait TokenStorage: Send + Sync {
    /// Store `token`, replacing whatever was stored before.
    fn set(&self, token: &TokenInfo) -> io::Result<()>;

    /// A `None` result indicates that no token has been stored yet. A stored value that
    /// cannot be decoded is reported as an error of kind `InvalidData`.
    fn get(&self) -> io::Result<Option<TokenInfo>>;
}

/// A storage that remembers a value for one session only.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    token: Mutex<Option<TokenInfo>>,
}

impl MemoryStorage {
    /// An empty storage.
    pub fn new() -> MemoryStorage {
        Default::default()
    }
}

impl MemoryStorage {
    fn slot(&self) -> io::Result<MutexGuard<'_, Option<TokenInfo>>> {
        self.token
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "token storage lock poisoned"))
    }
}

impl TokenStorage for MemoryStorage {
    fn set(&self, token: &TokenInfo) -> io::Result<()> {
        *self.slot()? = Some(token.clone());
        Ok(())
    }

    fn get(&self) -> io::Result<Option<TokenInfo>> {
        Ok(self.slot()?.clone())
    }
}

/// Serializes the token to a JSON file on disk.
#[derive(Debug)]
pub struct DiskStorage {
    location: PathBuf,
}

impl DiskStorage {
    /// A storage backed by the file at `location`. Nothing is read or written until the
    /// storage is used.
    pub fn new<S: Into<PathBuf>>(location: S) -> DiskStorage {
        DiskStorage {
            location: location.into(),
        }
    }

    /// The file this storage reads and writes.
    pub fn location(&self) -> &Path {
        &self.location
    }

    fn ensure_parent_dir(&self) {
        let dir = match self.location.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => return,
        };
        match fs::create_dir_all(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                log::warn!(
                    "Failed to store token. Could not create {} ({})",
                    dir.display(),
                    e
                );
            }
        }
    }
}

fn load_from_file(filename: &Path) -> io::Result<TokenInfo> {
    let contents = fs::read(filename)?;
    serde_json::from_slice(&contents).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: {}", filename.display(), e),
        )
    })
}

impl TokenStorage for DiskStorage {
    fn set(&self, token: &TokenInfo) -> io::Result<()> {
        self.ensure_parent_dir();

        let serialized = serde_json::to_string(token)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut f = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.location)
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", self.location.display(), e)))?;
        f.write_all(serialized.as_bytes())?;
        log::info!("Token stored to {}", self.location.display());
        Ok(())
    }

    fn get(&self) -> io::Result<Option<TokenInfo>> {
        match load_from_file(&self.location) {
            Ok(token) => Ok(Some(token)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
