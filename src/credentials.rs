//! Bearer-token credentials, passed explicitly into every authenticated call.

use crate::errors::ApiError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, PoisonError, RwLock,
    },
};

/// Shared handle to the current session's token.
///
/// Cloning is cheap; all clones observe the same token, so a 401 seen by one
/// request signs out every holder.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    token: RwLock<Option<String>>,
    signed_out: AtomicBool,
    store: Option<CredentialStore>,
}

#[derive(Deserialize)]
struct Claims {
    id: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                token: RwLock::new(Some(token.into())),
                ..Default::default()
            }),
        }
    }

    /// Credentials backed by a token file; loads whatever token is persisted.
    pub fn from_store(store: CredentialStore) -> Result<Self, ApiError> {
        let token = store.load()?;
        Ok(Self {
            inner: Arc::new(Inner {
                token: RwLock::new(token),
                signed_out: AtomicBool::new(false),
                store: Some(store),
            }),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// True once a 401 has cleared the token.
    pub fn is_signed_out(&self) -> bool {
        self.inner.signed_out.load(Ordering::SeqCst)
    }

    pub fn set_token(&self, token: impl Into<String>) -> Result<(), ApiError> {
        let token = token.into();
        if let Some(store) = &self.inner.store {
            store.save(&token)?;
        }
        *self.inner.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        self.inner.signed_out.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Drops the token in memory and on disk.
    pub fn clear(&self) {
        *self.inner.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.signed_out.store(true, Ordering::SeqCst);
        if let Some(store) = &self.inner.store {
            if let Err(e) = store.clear() {
                tracing::warn!(path = %store.path().display(), error = %e, "Failed to remove persisted token");
            }
        }
    }

    /// Id of the signed-in user, read from the JWT payload.
    ///
    /// The signature is not verified; the server does that on every request.
    pub fn user_id(&self) -> Result<String, ApiError> {
        let token = self
            .token()
            .ok_or_else(|| ApiError::InvalidInput("no token".into()))?;
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| ApiError::InvalidInput("malformed JWT".into()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| ApiError::InvalidInput(format!("JWT payload: {}", e)))?;
        let claims: Claims = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidInput(format!("JWT claims: {}", e)))?;
        Ok(claims.id)
    }
}

/// Token file standing in for browser local storage.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, token)
    }

    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) fn jwt_for(user_id: &str) -> String {
    let claims = serde_json::json!({ "id": user_id }).to_string();
    format!("e30.{}.sig", URL_SAFE_NO_PAD.encode(claims))
}
