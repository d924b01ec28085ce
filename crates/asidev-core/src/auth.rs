//! Session surface for the external OAuth collaborator
//!
//! The OAuth dance itself (redirect, callback, token exchange, profile
//! fetch) belongs to an external helper program; on success it writes
//! `session.json` next to the config file. This module only reads,
//! triggers, and clears that session — the three opaque operations the
//! rest of the app is allowed to know about.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{anyhow, Result};

use crate::config::Config;

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub image_url: Option<String>,
}

/// File-backed view of the collaborator-managed session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn open() -> Result<Self> {
        Ok(Self {
            path: Config::config_dir()?.join("session.json"),
        })
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the current session, if the collaborator has established one.
    pub fn current_user(&self) -> Option<UserProfile> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!("ignoring malformed session file: {e}");
                None
            }
        }
    }

    /// Opaque sign-in trigger: hands control to the configured external
    /// sign-in helper, which runs the provider flow and writes the session
    /// file once the user completes it.
    pub fn sign_in(&self, config: &Config) -> Result<()> {
        let command = config
            .sign_in_command
            .clone()
            .ok_or_else(|| anyhow!("no sign_in_command configured"))?;

        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("sign_in_command is empty"))?;

        Command::new(program)
            .args(parts)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        tracing::info!("sign-in helper started");
        Ok(())
    }

    /// Drop the local session. The provider-side session is the
    /// collaborator's concern; only the stored profile goes away.
    pub fn sign_out(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        tracing::info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_profile_the_collaborator_wrote() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let profile = UserProfile {
            name: "Dana Developer".to_string(),
            image_url: Some("https://example.com/dana.png".to_string()),
        };
        fs::write(&path, serde_json::to_string(&profile).unwrap()).unwrap();

        let store = SessionStore::at(path);
        assert_eq!(store.current_user(), Some(profile));
    }

    #[test]
    fn no_session_file_means_no_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("absent.json"));
        assert_eq!(store.current_user(), None);
    }

    #[test]
    fn malformed_session_is_treated_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json at all").unwrap();

        let store = SessionStore::at(path);
        assert_eq!(store.current_user(), None);
    }

    #[test]
    fn sign_out_removes_the_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{}").unwrap();

        let store = SessionStore::at(path.clone());
        store.sign_out().unwrap();
        assert!(!path.exists());

        // a second sign-out is a no-op
        store.sign_out().unwrap();
    }

    #[test]
    fn sign_in_requires_a_configured_helper() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        let err = store.sign_in(&Config::new()).unwrap_err();
        assert!(err.to_string().contains("sign_in_command"));
    }
}
