//! Client-side credential storage.
//!
//! The access token is the only credential the layer can see: the refresh
//! token lives in an HttpOnly cookie held by the HTTP client's cookie jar.
//! A [`CredentialStore`] keeps the access token and the signed-in user, and
//! exactly one access token is stored at a time; a refresh replaces it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use lampstand_core::User;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a credential store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt credential file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Callback invoked when the session cannot be refreshed.
pub type SessionExpiredHandler = Arc<dyn Fn() + Send + Sync>;

/// Storage for the access token and signed-in user.
pub trait CredentialStore: Send + Sync {
    /// Current access token, if signed in.
    fn access_token(&self) -> Option<SecretString>;

    /// Replace the access token.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be written.
    fn set_access_token(&self, token: SecretString) -> Result<(), StoreError>;

    /// The signed-in user, if known.
    fn user(&self) -> Option<User>;

    /// Replace the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be written.
    fn set_user(&self, user: Option<User>) -> Result<(), StoreError>;

    /// Remove every stored credential.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be written.
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Default)]
struct Credentials {
    access_token: Option<SecretString>,
    user: Option<User>,
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local credential store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    state: RwLock<Credentials>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with an access token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(Credentials {
                access_token: Some(SecretString::from(token.into())),
                user: None,
            }),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn access_token(&self) -> Option<SecretString> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token
            .clone()
    }

    fn set_access_token(&self, token: SecretString) -> Result<(), StoreError> {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token = Some(token);
        Ok(())
    }

    fn user(&self) -> Option<User> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .clone()
    }

    fn set_user(&self, user: Option<User>) -> Result<(), StoreError> {
        self.state.write().unwrap_or_else(PoisonError::into_inner).user = user;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Credentials::default();
        Ok(())
    }
}

// =============================================================================
// File-backed store
// =============================================================================

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<User>,
}

/// Credential store persisted as a JSON file, for command-line sessions.
///
/// The file is read once on open and rewritten on every change. A missing
/// file is an empty store.
pub struct FileCredentialStore {
    path: PathBuf,
    cache: MemoryCredentialStore,
}

impl FileCredentialStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<CredentialFile>(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CredentialFile::default(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let cache = MemoryCredentialStore {
            state: RwLock::new(Credentials {
                access_token: file.access_token.map(SecretString::from),
                user: file.user,
            }),
        };

        Ok(Self { path, cache })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        let file = CredentialFile {
            access_token: self
                .cache
                .access_token()
                .map(|token| token.expose_secret().to_string()),
            user: self.cache.user(),
        };

        if file.access_token.is_none() && file.user.is_none() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(StoreError::Io {
                    path: self.path.clone(),
                    source: e,
                }),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, contents).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl CredentialStore for FileCredentialStore {
    fn access_token(&self) -> Option<SecretString> {
        self.cache.access_token()
    }

    fn set_access_token(&self, token: SecretString) -> Result<(), StoreError> {
        self.cache.set_access_token(token)?;
        self.persist()
    }

    fn user(&self) -> Option<User> {
        self.cache.user()
    }

    fn set_user(&self, user: Option<User>) -> Result<(), StoreError> {
        self.cache.set_user(user)?;
        self.persist()
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.cache.clear()?;
        self.persist()
    }
}
