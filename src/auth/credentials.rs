use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client registration as downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
struct CredentialsFile {
    installed: Option<ClientCredentials>,
    web: Option<ClientCredentials>,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

pub fn parse_client_credentials(json: &str) -> Result<ClientCredentials> {
    let file: CredentialsFile = serde_json::from_str(json)?;
    file.installed
        .or(file.web)
        .ok_or_else(|| anyhow!("client credentials have neither 'installed' nor 'web' section"))
}

pub fn load_client_credentials(path: &Path) -> Result<ClientCredentials> {
    let s = fs::read_to_string(path)
        .map_err(|e| anyhow!("Unable to read client secret file {}: {e}", path.display()))?;
    parse_client_credentials(&s)
}
