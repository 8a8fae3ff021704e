use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{APP_DIR, config_dir};

/// Cached token metadata in ~/.config/rs_mail_printer/tokens.json.
///
/// The refresh token normally lives in the OS keyring; it is only written
/// here when no keyring is reachable (headless machines).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TokensFile {
    pub access_token: Option<String>,
    pub expires_at_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

pub fn tokens_path() -> Result<PathBuf> {
    let p = config_dir()?;
    fs::create_dir_all(&p)?;
    Ok(p.join("tokens.json"))
}

pub fn load_tokens(path: &Path) -> Result<Option<TokensFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&s)?))
}

pub fn save_tokens(path: &Path, tokens: &TokensFile) -> Result<()> {
    let s = serde_json::to_string_pretty(tokens)?;
    fs::write(path, s)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

fn keyring_load(account: &str) -> Result<Option<String>> {
    match Entry::new(APP_DIR, account)?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}

fn keyring_save(account: &str, refresh_token: &str) -> Result<()> {
    Entry::new(APP_DIR, account)?
        .set_password(refresh_token)
        .map_err(|e| anyhow!(e.to_string()))
}

/// Refresh token for `account`: keyring first, then the tokens file.
pub fn load_refresh_token(account: &str, path: &Path) -> Result<Option<String>> {
    match keyring_load(account) {
        Ok(Some(rt)) => return Ok(Some(rt)),
        Ok(None) => {}
        Err(e) => warn!("keyring unavailable ({e}); using tokens file"),
    }
    Ok(load_tokens(path)?.and_then(|t| t.refresh_token))
}

/// Store the refresh token in the keyring, or in `file` if that fails.
pub fn store_refresh_token(account: &str, refresh_token: &str, file: &mut TokensFile) {
    match keyring_save(account, refresh_token) {
        Ok(()) => file.refresh_token = None,
        Err(e) => {
            warn!("couldn't save refresh token to keyring ({e}); keeping it in tokens file");
            file.refresh_token = Some(refresh_token.to_string());
        }
    }
}
