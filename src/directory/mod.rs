//! Player directory.
//!
//! Maps in-game nicknames to registered identities and persists them to a
//! JSON file (the legacy `users.json` layout). The directory is an explicit
//! value: callers load a snapshot, pass it to the aggregator, and save it
//! back after registering or mapping players.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::types::{normalize_login, Identity, SettleError};

/// Resolves a session alias to the identity it belongs to.
pub trait IdentityLookup {
    fn resolve(&self, alias: &str) -> Option<&Identity>;
}

/// In-memory snapshot of every registered identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    identities: Vec<Identity>,
}

impl Directory {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn by_login(&self, login: &str) -> Option<&Identity> {
        let login = normalize_login(login);
        self.identities.iter().find(|id| id.login == login)
    }

    // -- Persistence -----------------------------------------------------

    /// Load the directory from a JSON file.
    /// A missing file yields an empty directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No directory file found, starting empty");
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read directory from {}", path.display()))?;

        let identities: Vec<Identity> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse directory from {}", path.display()))?;

        debug!(path = %path.display(), identities = identities.len(), "Directory loaded");
        Ok(Self { identities })
    }

    /// Write the directory to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.identities)
            .context("Failed to serialise directory")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write directory to {}", path.display()))?;

        debug!(path = %path.display(), identities = self.identities.len(), "Directory saved");
        Ok(())
    }

    // -- Mutation --------------------------------------------------------

    /// Register a new identity owning a single nickname.
    pub fn register(
        &mut self,
        nickname: &str,
        login: &str,
        payment_info: &str,
    ) -> Result<&Identity, SettleError> {
        require(&[
            ("IN_GAME_NICKNAME", nickname),
            ("LOGIN", login),
            ("PAYMENT_INFO", payment_info),
        ])?;
        let login = normalize_login(login);

        for id in &self.identities {
            if id.login == login {
                return Err(SettleError::LoginTaken(login));
            }
            if id.matches(nickname) {
                return Err(SettleError::NicknameTaken { login: id.login.clone() });
            }
        }

        info!(login = %login, nickname, "Registering player");
        self.identities.push(Identity {
            login,
            aliases: vec![nickname.to_string()],
            payment_destination: payment_info.to_string(),
        });
        Ok(&self.identities[self.identities.len() - 1])
    }

    /// Attach another nickname to an existing identity.
    pub fn map_alias(&mut self, nickname: &str, login: &str) -> Result<&Identity, SettleError> {
        require(&[("IN_GAME_NICKNAME", nickname), ("LOGIN", login)])?;
        let login = normalize_login(login);

        if let Some(owner) = self
            .identities
            .iter()
            .find(|id| id.login != login && id.matches(nickname))
        {
            return Err(SettleError::AliasOwned {
                alias: nickname.to_string(),
                login: owner.login.clone(),
            });
        }

        let identity = self
            .identities
            .iter_mut()
            .find(|id| id.login == login)
            .ok_or_else(|| SettleError::UnknownLogin(login.clone()))?;

        if identity.aliases.iter().any(|a| a == nickname) {
            debug!(login = %login, nickname, "Nickname already mapped");
        } else {
            info!(login = %login, nickname, "Mapping nickname");
            identity.aliases.push(nickname.to_string());
        }
        Ok(identity)
    }
}

impl IdentityLookup for Directory {
    fn resolve(&self, alias: &str) -> Option<&Identity> {
        self.identities.iter().find(|id| id.matches(alias))
    }
}

/// Collect every empty parameter into one error.
fn require(params: &[(&'static str, &str)]) -> Result<(), SettleError> {
    let missing: Vec<&'static str> = params
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SettleError::MissingParameters(missing))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
