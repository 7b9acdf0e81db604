//! OAuth token cache.
//!
//! The file backend is what runs in production; the in-memory backend backs
//! tests and one-shot runs that should not touch disk.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{GoogleApiError, GoogleToken};

pub trait TokenStore {
    /// `Ok(None)` when nothing has been cached yet.
    fn load(&self) -> Result<Option<GoogleToken>, GoogleApiError>;
    fn save(&self, token: &GoogleToken) -> Result<(), GoogleApiError>;
    fn delete(&self) -> Result<(), GoogleApiError>;

    /// True when there is no cached token or the cached grant does not cover
    /// `required`, meaning only a fresh consent can satisfy the run.
    fn needs_reconsent(&self, required: &[&str]) -> Result<bool, GoogleApiError> {
        Ok(match self.load()? {
            Some(token) => !token.covers_scopes(required),
            None => true,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<GoogleToken>, GoogleApiError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, token: &GoogleToken) -> Result<(), GoogleApiError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(token)?;
        atomic_write(&self.path, &content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn delete(&self) -> Result<(), GoogleApiError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Write to a sibling temp file, then rename over the target.
fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = std::fs::File::create(&tmp)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&tmp, path)
}

#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    token: Mutex<Option<GoogleToken>>,
}

impl InMemoryTokenStore {
    pub fn with_token(token: GoogleToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<GoogleToken>> {
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Option<GoogleToken>, GoogleApiError> {
        Ok(self.slot().clone())
    }

    fn save(&self, token: &GoogleToken) -> Result<(), GoogleApiError> {
        *self.slot() = Some(token.clone());
        Ok(())
    }

    fn delete(&self) -> Result<(), GoogleApiError> {
        self.slot().take();
        Ok(())
    }
}
