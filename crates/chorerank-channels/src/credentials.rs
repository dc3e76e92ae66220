//! Credential persistence for the transport session.

use chorerank_core::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::transport::Credentials;

/// Load/save/clear the session credentials.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credentials>>;
    fn save(&self, credentials: &Credentials) -> Result<()>;
    /// Idempotent.
    fn clear(&self) -> Result<()>;
}

/// JSON file with owner-only permissions.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let credentials: Credentials = serde_json::from_str(&content)?;
        tracing::debug!("🔑 Loaded credentials from {}", self.path.display());
        Ok(Some(credentials))
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(credentials)?;

        // Set restrictive permissions on Unix (0600)
        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)?;
            file.write_all(json.as_bytes())?;
        }

        #[cfg(not(unix))]
        std::fs::write(&self.path, json)?;

        tracing::debug!("🔑 Credentials saved to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("🔑 Credentials cleared ({})", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Option<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new(initial: Option<Credentials>) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Credentials>> {
        // A panic while holding this lock cannot leave the Option half-written.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credentials>> {
        Ok(self.slot().clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        *self.slot() = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}
