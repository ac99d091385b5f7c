use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// Tokens within this window of expiry count as expired, so a request made
// right after the check cannot race the deadline.
const EXPIRY_SKEW_SECS: u64 = 60;

/// Serialized authorization token. Persisted as token.json with 0600 perms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: u64,
    pub scopes: Vec<String>,
}

impl StoredToken {
    pub fn is_valid(&self) -> bool {
        now() + EXPIRY_SKEW_SECS < self.expires_at
    }
}

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// OAuth client credentials in Google's client_secret.json layout.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

/// client_secret.json wraps the credentials in an "installed" or "web"
/// envelope depending on how the OAuth client was registered.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let file: ClientSecretsFile = serde_json::from_str(&contents)
            .with_context(|| format!("Could not parse {}", path.display()))?;
        file.installed
            .or(file.web)
            .with_context(|| format!("No client credentials in {}", path.display()))
    }
}
