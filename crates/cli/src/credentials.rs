//! Operator accounts persisted as a JSON map of user to hashed password and role.
//!
//! ```json
//! { "ana": { "password": "<sha256 hex>", "role": "Engineer" } }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Roles offered at registration. Other text is stored as given.
pub const KNOWN_ROLES: [&str; 5] = ["Operator", "Engineer", "Supervisor", "Analyst", "Admin"];

pub const DEFAULT_ROLE: &str = "Operator";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("please fill in all fields ({0} is empty)")]
    MissingField(&'static str),

    #[error("username already exists: {0}")]
    DuplicateUser(String),

    #[error("user not found: {0}")]
    UnknownUser(String),

    #[error("incorrect password for {0}")]
    WrongPassword(String),

    #[error("credential store IO error ({path}): {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("credential store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Hex SHA-256 of the password.
    pub password: String,
    pub role: String,
}

/// A verified login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: String,
    pub role: String,
}

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub struct CredentialStore {
    path: PathBuf,
    users: BTreeMap<String, Account>,
}

impl CredentialStore {
    /// Load the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CredentialError> {
        let path = path.into();
        let users = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(CredentialError::Io { path, source }),
        };
        debug!(path = %path.display(), users = users.len(), "Credential store opened");
        Ok(Self { path, users })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add an account and persist the store. A blank role becomes `Operator`.
    pub fn register(&mut self, user: &str, password: &str, role: &str) -> Result<(), CredentialError> {
        let user = user.trim();
        if user.is_empty() {
            return Err(CredentialError::MissingField("username"));
        }
        if password.trim().is_empty() {
            return Err(CredentialError::MissingField("password"));
        }
        if self.users.contains_key(user) {
            return Err(CredentialError::DuplicateUser(user.to_string()));
        }

        let role = match role.trim() {
            "" => DEFAULT_ROLE.to_string(),
            r => KNOWN_ROLES
                .iter()
                .find(|known| known.eq_ignore_ascii_case(r))
                .map_or_else(|| r.to_string(), |known| known.to_string()),
        };

        self.users.insert(
            user.to_string(),
            Account {
                password: hash_password(password),
                role,
            },
        );
        self.save()?;
        info!(user = %user, "Account registered");
        Ok(())
    }

    pub fn verify(&self, user: &str, password: &str) -> Result<Session, CredentialError> {
        let user = user.trim();
        let account = self
            .users
            .get(user)
            .ok_or_else(|| CredentialError::UnknownUser(user.to_string()))?;
        if account.password != hash_password(password) {
            return Err(CredentialError::WrongPassword(user.to_string()));
        }
        Ok(Session {
            user: user.to_string(),
            role: account.role.clone(),
        })
    }

    /// `(user, role)` pairs in name order.
    pub fn users(&self) -> impl Iterator<Item = (&str, &str)> {
        self.users
            .iter()
            .map(|(user, account)| (user.as_str(), account.role.as_str()))
    }

    fn save(&self) -> Result<(), CredentialError> {
        let io_err = |source| CredentialError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.users)?;
        std::fs::write(&self.path, json).map_err(io_err)?;
        debug!(path = %self.path.display(), "Credential store saved");
        Ok(())
    }
}
