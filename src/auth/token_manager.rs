use anyhow::{Result, anyhow};
use log::{info, warn};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::credentials::{ClientCredentials, load_client_credentials};
use crate::auth::oauth::{self, Tokens};
use crate::auth::token_store::{self, TokensFile};
use crate::config::Config;
use crate::error::MailError;
use crate::mail::provider::TokenSource;

/// Seconds shaved off the advertised lifetime so a token does not expire
/// in the middle of a cycle.
const EXPIRY_MARGIN_SECS: i64 = 300;
const FALLBACK_LIFETIME_SECS: i64 = 3500;

pub struct TokenManager {
    credentials: ClientCredentials,
    account: String,
    redirect_uri: String,
    tokens_path: PathBuf,
}

impl TokenManager {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self {
            credentials: load_client_credentials(&cfg.client_secret_path()?)?,
            account: cfg.account.clone(),
            redirect_uri: cfg.redirect_uri(),
            tokens_path: token_store::tokens_path()?,
        })
    }

    /// Returns a valid access token: cached, refreshed, or (when
    /// `interactive`) obtained through the browser flow.
    pub fn get_access_token(&self, interactive: bool) -> Result<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;

        if let Some(TokensFile {
            access_token: Some(at),
            expires_at_epoch: Some(exp),
            ..
        }) = token_store::load_tokens(&self.tokens_path)?
            && now < exp
        {
            return Ok(at);
        }

        if let Some(rt) = token_store::load_refresh_token(&self.account, &self.tokens_path)? {
            match oauth::refresh_access_token(&self.credentials, &rt) {
                Ok(t) => return self.persist(now, t, Some(rt)),
                Err(e) if interactive => warn!("{e}; falling back to interactive auth"),
                Err(e) => return Err(e),
            }
        }

        if !interactive {
            anyhow::bail!("no usable credentials for {}; run `login` first", self.account);
        }

        let t = oauth::perform_pkce_flow(&self.credentials, &self.redirect_uri)?;
        self.persist(now, t, None)
    }

    /// Trade the stored refresh token for a new access token, ignoring the
    /// cached one. Used when the API rejects a token before its recorded
    /// expiry.
    pub fn refresh_now(&self) -> Result<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
        let rt = token_store::load_refresh_token(&self.account, &self.tokens_path)?
            .ok_or_else(|| anyhow!("no refresh token for {}; run `login` first", self.account))?;
        let t = oauth::refresh_access_token(&self.credentials, &rt)?;
        self.persist(now, t, Some(rt))
    }

    /// Always go through the browser and replace whatever is cached.
    pub fn login(&self) -> Result<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
        let t = oauth::perform_pkce_flow(&self.credentials, &self.redirect_uri)?;
        self.persist(now, t, None)
    }

    fn persist(&self, now: i64, t: Tokens, previous_refresh: Option<String>) -> Result<String> {
        let lifetime = t
            .expires_in
            .map(|s| s as i64 - EXPIRY_MARGIN_SECS)
            .unwrap_or(FALLBACK_LIFETIME_SECS);

        let mut file = TokensFile {
            access_token: Some(t.access_token.clone()),
            expires_at_epoch: Some(now + lifetime.max(0)),
            refresh_token: None,
        };

        // Google only returns a refresh token on consent; keep the old one.
        match t.refresh_token.or(previous_refresh) {
            Some(rt) => token_store::store_refresh_token(&self.account, &rt, &mut file),
            None => warn!("provider returned no refresh token; login will be needed again"),
        }

        token_store::save_tokens(&self.tokens_path, &file)?;
        info!("cached access token for {}", self.account);
        Ok(t.access_token)
    }
}

impl TokenSource for TokenManager {
    fn refresh(&self) -> Result<String, MailError> {
        self.refresh_now().map_err(|e| MailError::Auth(format!("{e:#}")))
    }
}
