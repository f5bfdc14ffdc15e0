//! Credential loading from an optional `.env` file.
//!
//! Keys in the file act as a fallback environment: the process environment
//! always wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use crate::config::config_dir;

/// Env var naming an explicit `.env` file.
pub const ENV_FILE_ENV: &str = "SMARTTASK_ENV_FILE";

/// Credentials loaded from a `.env` file.
#[derive(Clone, Default)]
pub struct Credentials {
    vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from a key-value map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Returns a credential value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Whether no credentials were loaded.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Resolve `key` from `env` first, then from these credentials.
    pub fn layered<'a>(
        &'a self,
        env: impl Fn(&str) -> Option<String> + 'a,
    ) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| env(key).or_else(|| self.get(key).map(str::to_owned))
    }
}

/// Load credentials from a specific `.env` path.
///
/// A missing file yields empty credentials.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_credentials(path: &Path) -> anyhow::Result<Credentials> {
    if !path.exists() {
        debug!(path = %path.display(), "no credentials file found");
        return Ok(Credentials::default());
    }

    warn_if_shared(path);

    let mut vars = BTreeMap::new();
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to read credentials at {}", path.display()))?;

    for item in iter {
        let (key, value) = item.with_context(|| {
            format!(
                "failed to parse key-value entry in credentials file {}",
                path.display()
            )
        })?;
        vars.insert(key, value);
    }

    debug!(path = %path.display(), keys = vars.len(), "loaded credentials");
    Ok(Credentials { vars })
}

/// Load credentials from `$SMARTTASK_ENV_FILE` or `~/.smarttask/.env`.
///
/// # Errors
///
/// Returns an error when no path can be resolved or the file is invalid.
pub fn load_default_credentials(
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Credentials> {
    load_credentials(&credentials_path_with(env)?)
}

/// Resolve the credentials file path using a custom env resolver.
///
/// # Errors
///
/// Returns an error if the variable is unset and the home directory cannot
/// be determined.
pub fn credentials_path_with(env: impl Fn(&str) -> Option<String>) -> anyhow::Result<PathBuf> {
    if let Some(p) = env(ENV_FILE_ENV).filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(p));
    }
    Ok(config_dir()?.join(".env"))
}

#[cfg(unix)]
fn warn_if_shared(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = std::fs::metadata(path) {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                mode = %format!("{mode:o}"),
                "credentials file is readable by other users; consider chmod 600"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_shared(_path: &Path) {}
