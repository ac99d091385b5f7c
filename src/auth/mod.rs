mod oauth;
mod pkce;

use std::path::PathBuf;

use anyhow::Result;

use crate::api::YouTubeClient;
use crate::config::Config;
use crate::error::Error;
use crate::net;
use crate::notify::Notifier;
use crate::storage::{ClientSecrets, StoredToken, TokenCache};

/// Produces an authenticated API client from the cached token, a refresh
/// exchange, or a fresh interactive authorization, in that order.
pub struct Authenticator {
    scopes: Vec<String>,
    secrets_path: PathBuf,
    cache: TokenCache,
    notifier: Notifier,
    client: Option<YouTubeClient>,
}

impl Authenticator {
    pub fn new(config: &Config) -> Self {
        Self {
            scopes: config.scopes.clone(),
            secrets_path: config.client_secrets_file.clone(),
            cache: TokenCache::new(config.token_cache_file.clone()),
            notifier: Notifier::new(config.notify.clone()),
            client: None,
        }
    }

    /// Authenticated API client, cached for the lifetime of this instance.
    /// Repeated calls reuse the handle without re-authenticating.
    pub fn client(&mut self) -> Result<&YouTubeClient> {
        if self.client.is_none() {
            let token = self.token()?;
            self.client = Some(YouTubeClient::new(token.access_token));
        }
        Ok(self.client.as_ref().unwrap())
    }

    /// Produce a usable token. Requires connectivity; raises the
    /// distinguished offline error before touching credentials.
    pub fn token(&self) -> Result<StoredToken> {
        if !net::check_internet_connection() {
            return Err(Error::Offline.into());
        }

        let secrets = ClientSecrets::load(&self.secrets_path)?;

        if let Some(cached) = self.cache.load() {
            if cached.is_valid() {
                return Ok(cached);
            }
            if cached.refresh_token.is_some() {
                match oauth::refresh(&secrets, &cached) {
                    Ok(token) => {
                        self.cache.save(&token)?;
                        return Ok(token);
                    }
                    Err(e) => {
                        eprintln!("Token refresh failed ({}); starting a new authorization.", e);
                    }
                }
            }
        }

        let notifier = &self.notifier;
        let token = oauth::authenticate(&secrets, &self.scopes, |auth_url| {
            eprintln!("Please authorize this app by visiting:\n{}", auth_url);
            notifier.send_auth_url(auth_url);
        })?;
        self.cache.save(&token)?;
        Ok(token)
    }
}
