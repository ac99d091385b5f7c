use std::collections::HashMap;
use std::sync::mpsc;

use anyhow::{Context, Result};
use rand::Rng;
use serde::Deserialize;
use tiny_http::{Response, Server};
use url::Url;

use crate::storage::{self, ClientSecrets, StoredToken};

use super::pkce::PkceChallenge;

const CALLBACK_ADDR: &str = "127.0.0.1:8488";
const REDIRECT_URI: &str = "http://localhost:8488/callback";
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Run the interactive authorization flow. The authorization URL is handed
/// to `on_auth_url` (console + optional email); no browser is opened here,
/// since the grant may happen on a different machine than the one running
/// the callback server.
pub fn authenticate<F>(
    secrets: &ClientSecrets,
    scopes: &[String],
    on_auth_url: F,
) -> Result<StoredToken>
where
    F: FnOnce(&str),
{
    let pkce = PkceChallenge::generate();
    let state: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    let mut auth_url = Url::parse(AUTH_URL)?;
    auth_url
        .query_pairs_mut()
        .append_pair("client_id", &secrets.client_id)
        .append_pair("redirect_uri", REDIRECT_URI)
        .append_pair("response_type", "code")
        .append_pair("scope", &scopes.join(" "))
        .append_pair("state", &state)
        .append_pair("code_challenge", &pkce.challenge)
        .append_pair("code_challenge_method", "S256")
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent"); // Force consent to get refresh_token

    let server = Server::http(CALLBACK_ADDR)
        .map_err(|e| anyhow::anyhow!("Failed to start local callback server: {}", e))?;

    on_auth_url(auth_url.as_str());

    eprintln!("Waiting for authorization...");

    let (tx, rx) = mpsc::channel();

    for request in server.incoming_requests() {
        let url = format!("http://localhost{}", request.url());
        let parsed = Url::parse(&url)?;
        let params: HashMap<_, _> = parsed.query_pairs().collect();

        if let (Some(code), Some(recv_state)) = (params.get("code"), params.get("state")) {
            if recv_state.as_ref() != state {
                let response = Response::from_string("State mismatch! Please try again.");
                let _ = request.respond(response);
                anyhow::bail!("OAuth state mismatch");
            }

            let response = Response::from_string(
                "<html><body><h1>Authorization successful!</h1><p>You may close this window.</p></body></html>"
            );
            let _ = request.respond(response);

            tx.send(code.to_string())?;
            break;
        } else if let Some(error) = params.get("error") {
            let desc = params
                .get("error_description")
                .map(|s| s.to_string())
                .unwrap_or_default();
            let response =
                Response::from_string(format!("Authorization failed: {} {}", error, desc));
            let _ = request.respond(response);
            anyhow::bail!("Authorization failed: {} {}", error, desc);
        }
    }

    let code = rx.recv()?;
    let tokens = exchange_code_for_token(secrets, &code, &pkce.verifier)?;

    let access_token = tokens.access_token.context("No access token received")?;
    let refresh_token = tokens.refresh_token;
    let expires_at = storage::now() + tokens.expires_in.unwrap_or(0);

    Ok(StoredToken {
        access_token,
        refresh_token,
        expires_at,
        scopes: scopes.to_vec(),
    })
}

/// Exchange a refresh token for a fresh access token, keeping the refresh
/// token and scope list of the expired credential.
pub fn refresh(secrets: &ClientSecrets, expired: &StoredToken) -> Result<StoredToken> {
    let refresh_token = expired
        .refresh_token
        .as_deref()
        .context("No refresh token available")?;

    let client = reqwest::blocking::Client::new();

    let mut params = HashMap::new();
    params.insert("client_id", secrets.client_id.as_str());
    params.insert("client_secret", secrets.client_secret.as_str());
    params.insert("refresh_token", refresh_token);
    params.insert("grant_type", "refresh_token");

    let response: TokenResponse = client.post(TOKEN_URL).form(&params).send()?.json()?;

    if let Some(error) = response.error {
        let desc = response.error_description.unwrap_or_default();
        anyhow::bail!("Token refresh failed: {} {}", error, desc);
    }

    Ok(StoredToken {
        access_token: response.access_token.context("No access token received")?,
        refresh_token: Some(refresh_token.to_string()),
        expires_at: storage::now() + response.expires_in.unwrap_or(0),
        scopes: expired.scopes.clone(),
    })
}

fn exchange_code_for_token(
    secrets: &ClientSecrets,
    code: &str,
    verifier: &str,
) -> Result<TokenResponse> {
    let client = reqwest::blocking::Client::new();

    let mut params = HashMap::new();
    params.insert("client_id", secrets.client_id.as_str());
    params.insert("client_secret", secrets.client_secret.as_str());
    params.insert("code", code);
    params.insert("redirect_uri", REDIRECT_URI);
    params.insert("code_verifier", verifier);
    params.insert("grant_type", "authorization_code");

    let response: TokenResponse = client.post(TOKEN_URL).form(&params).send()?.json()?;

    if let Some(error) = response.error {
        let desc = response.error_description.unwrap_or_default();
        anyhow::bail!("Token exchange failed: {} {}", error, desc);
    }

    Ok(response)
}
