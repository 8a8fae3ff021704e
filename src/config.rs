use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::user::AuthorizedUser;
use crate::pipeline::PipelineConfig;
use crate::pipeline::extractor::ExistingFilePolicy;
use crate::pipeline::finalizer::FinalizePolicy;

pub const APP_DIR: &str = "rs_mail_printer";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Mailbox address; also the keyring entry for the refresh token.
    pub account: String,
    /// Gmail owner id used in API paths.
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// Google OAuth client file ("installed" or "web" credentials).
    pub client_secret_path: Option<String>,
    pub redirect_uri: Option<String>,
    /// Subject-line password for senders not listed below. Anyone who learns
    /// it can make this machine print; leave unset to disable.
    pub shared_token: Option<String>,
    #[serde(default)]
    pub authorized_users: Vec<AuthorizedUser>,
    #[serde(default)]
    pub attachments: AttachmentsConfig,
    #[serde(default)]
    pub printer: PrinterConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AttachmentsConfig {
    pub dir: Option<String>,
    #[serde(default)]
    pub existing: ExistingFilePolicy,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PrinterConfig {
    pub destination: String,
    #[serde(default = "default_print_command")]
    pub command: String,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            destination: "Deskjet-3050A-J611-series".to_string(),
            command: default_print_command(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub workers: usize,
    /// Gmail search narrowing the listing; eligibility is still checked per
    /// message.
    pub query: Option<String>,
    pub page_size: u32,
    pub max_pages: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            workers: 4,
            query: Some("is:unread category:personal".to_string()),
            page_size: 100,
            max_pages: 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ProcessingConfig {
    pub finalize: FinalizePolicy,
    pub mark_read_without_intent: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            finalize: FinalizePolicy::Always,
            mark_read_without_intent: true,
        }
    }
}

fn default_user_id() -> String {
    "me".to_string()
}

fn default_print_command() -> String {
    "lp".to_string()
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow!("no config dir available"))?
        .join(APP_DIR))
}

pub fn default_config_path() -> Result<PathBuf> {
    let p = config_dir()?;
    fs::create_dir_all(&p)?;
    Ok(p.join("config.toml"))
}

fn sample() -> Config {
    Config {
        account: "you@example.com".to_string(),
        user_id: default_user_id(),
        client_secret_path: None,
        redirect_uri: Some("http://127.0.0.1:8080/callback".to_string()),
        shared_token: None,
        authorized_users: vec![AuthorizedUser {
            name: "You".to_string(),
            emails: vec!["you@example.com".to_string()],
        }],
        attachments: AttachmentsConfig::default(),
        printer: PrinterConfig::default(),
        polling: PollingConfig::default(),
        processing: ProcessingConfig::default(),
    }
}

/// Load and validate the configuration. A missing file is replaced by a
/// template and reported as an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string_pretty(&sample())?)?;
        bail!(
            "Created template config at {} — edit it and run again",
            path.display()
        );
    }

    let s = fs::read_to_string(&path)?;
    let cfg: Config =
        toml::from_str(&s).map_err(|e| anyhow!("invalid config {}: {e}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.account.trim().is_empty() {
            bail!("account must not be empty");
        }
        for user in &self.authorized_users {
            if user.emails.is_empty() {
                bail!("authorized user '{}' has no email addresses", user.name);
            }
            if user.emails.iter().any(|e| e.trim().is_empty()) {
                bail!("authorized user '{}' has an empty email address", user.name);
            }
        }
        if self.authorized_users.is_empty() && self.shared_token().is_none() {
            bail!("no authorized_users and no shared_token: nobody could trigger an action");
        }
        if self.printer.destination.trim().is_empty() {
            bail!("printer.destination must not be empty");
        }
        if self.polling.workers == 0 {
            bail!("polling.workers must be at least 1");
        }
        if self.polling.interval_secs == 0 {
            bail!("polling.interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Shared token, if set to something non-blank.
    pub fn shared_token(&self) -> Option<&str> {
        self.shared_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn attachment_dir(&self) -> Result<PathBuf> {
        match &self.attachments.dir {
            Some(d) => Ok(PathBuf::from(d)),
            None => Ok(config_dir()?.join("files")),
        }
    }

    pub fn client_secret_path(&self) -> Result<PathBuf> {
        match &self.client_secret_path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Ok(config_dir()?.join("client_secret.json")),
        }
    }

    pub fn redirect_uri(&self) -> String {
        self.redirect_uri
            .clone()
            .unwrap_or_else(|| "http://127.0.0.1:8080/callback".to_string())
    }

    pub fn pipeline(&self) -> Result<PipelineConfig> {
        Ok(PipelineConfig {
            authorized_users: self.authorized_users.clone(),
            shared_token: self.shared_token().map(str::to_string),
            attachment_dir: self.attachment_dir()?,
            existing_files: self.attachments.existing,
            finalize: self.processing.finalize,
            mark_read_without_intent: self.processing.mark_read_without_intent,
        })
    }
}
