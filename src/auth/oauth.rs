use anyhow::{Result, anyhow};
use log::{info, warn};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tiny_http::{Response, Server};
use url::Url;

use crate::auth::credentials::ClientCredentials;

/// Read, list, and change labels; no sending or deleting.
pub const GMAIL_MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Tokens returned by the provider (in-memory)
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

impl From<BasicTokenResponse> for Tokens {
    fn from(token: BasicTokenResponse) -> Self {
        Self {
            access_token: token.access_token().secret().to_string(),
            refresh_token: token.refresh_token().map(|r| r.secret().to_string()),
            expires_in: token.expires_in().map(|d| d.as_secs()),
        }
    }
}

fn client(creds: &ClientCredentials) -> Result<BasicClient> {
    Ok(BasicClient::new(
        ClientId::new(creds.client_id.clone()),
        creds.client_secret.clone().map(ClientSecret::new),
        AuthUrl::new(creds.auth_uri.clone())?,
        Some(TokenUrl::new(creds.token_uri.clone())?),
    ))
}

pub fn refresh_access_token(creds: &ClientCredentials, refresh_token: &str) -> Result<Tokens> {
    let token = client(creds)?
        .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
        .request(http_client)
        .map_err(|e| anyhow!("token refresh failed: {e}"))?;
    Ok(token.into())
}

/// Authorization Code + PKCE flow with a loopback redirect. Opens the system
/// browser and waits for the callback on the redirect address.
pub fn perform_pkce_flow(creds: &ClientCredentials, redirect_uri: &str) -> Result<Tokens> {
    let redirect = Url::parse(redirect_uri)
        .map_err(|e| anyhow!("Invalid redirect_uri '{redirect_uri}': {e}"))?;
    let host = redirect
        .host_str()
        .ok_or_else(|| anyhow!("redirect_uri missing host: {redirect_uri}"))?;
    let port = redirect
        .port_or_known_default()
        .ok_or_else(|| anyhow!("redirect_uri missing/unknown port: {redirect_uri}"))?;

    let bind_ip: IpAddr = match host {
        "localhost" | "127.0.0.1" => IpAddr::V4(Ipv4Addr::LOCALHOST),
        other => other.parse::<IpAddr>().map_err(|_| {
            anyhow!("redirect_uri host must be localhost/127.0.0.1 or an IP: {other}")
        })?,
    };
    let bind_addr = SocketAddr::new(bind_ip, port);

    // Listen before handing out the URL so the redirect cannot arrive first.
    let server = Server::http(bind_addr)
        .map_err(|e| anyhow!("Failed to bind OAuth callback server on {bind_addr}: {e:?}"))?;

    let oauth_client = client(creds)?.set_redirect_uri(RedirectUrl::new(redirect_uri.to_string())?);
    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
    let (auth_url, csrf) = oauth_client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new(GMAIL_MODIFY_SCOPE.to_string()))
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent")
        .set_pkce_challenge(pkce_challenge)
        .url();

    println!("Open this URL in your browser:\n{auth_url}");
    if let Err(e) = open::that(auth_url.as_str()) {
        warn!("could not open browser automatically: {e}");
    }

    let code = wait_for_code(&server, host, port, csrf.secret())?;

    let token = oauth_client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(pkce_verifier)
        .request(http_client)
        .map_err(|e| anyhow!("Token exchange failed: {e}"))?;

    info!("authorization completed");
    Ok(token.into())
}

fn wait_for_code(server: &Server, host: &str, port: u16, expected_state: &str) -> Result<String> {
    let wait_until = Instant::now() + CALLBACK_TIMEOUT;

    while Instant::now() < wait_until {
        let Ok(Some(request)) = server.recv_timeout(Duration::from_millis(500)) else {
            continue;
        };

        // request.url() is only path+query
        let full = format!("http://{}:{}{}", host, port, request.url());
        let Ok(parsed) = Url::parse(&full) else {
            let _ = request.respond(Response::from_string("Bad redirect"));
            continue;
        };

        let mut code = None;
        let mut state = None;
        for (k, v) in parsed.query_pairs() {
            match k.as_ref() {
                "code" => code = Some(v.into_owned()),
                "state" => state = Some(v.into_owned()),
                _ => {}
            }
        }

        match code {
            Some(code) if state.as_deref() == Some(expected_state) => {
                let _ = request.respond(Response::from_string(
                    "Authorization received. You can close this tab.",
                ));
                return Ok(code);
            }
            Some(_) => {
                let _ = request.respond(Response::from_string("State mismatch, ignored."));
            }
            None => {
                let _ = request.respond(Response::from_string(
                    "No code found in redirect. You can close this tab.",
                ));
            }
        }
    }

    Err(anyhow!("No code received within timeout"))
}
