use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";
const DEFAULT_DOWNLOAD_TOOL: &str = "yt-dlp";

const ENV_NOTIFICATION_EMAIL: &str = "YTCLEAR_NOTIFICATION_EMAIL";
const ENV_SMTP_HOST: &str = "YTCLEAR_SMTP_HOST";
const ENV_SMTP_PORT: &str = "YTCLEAR_SMTP_PORT";
const ENV_SMTP_USERNAME: &str = "YTCLEAR_SMTP_USERNAME";
const ENV_SMTP_PASSWORD: &str = "YTCLEAR_SMTP_PASSWORD";

/// Resolved run configuration. Immutable once built.
#[derive(Debug, Clone)]
pub struct Config {
    pub scopes: Vec<String>,
    pub client_secrets_file: PathBuf,
    pub token_cache_file: PathBuf,
    pub playlist_url: Option<String>,
    pub playlist_id: Option<String>,
    pub download_dir: PathBuf,
    pub download_tool: String,
    pub notify: NotifySettings,
}

/// Optional outbound-mail settings. Secrets come from the environment only.
#[derive(Debug, Clone, Default)]
pub struct NotifySettings {
    pub email: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
}

/// Values supplied on the command line; these win over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub playlist_url: Option<String>,
    pub playlist_id: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub download_tool: Option<String>,
    pub client_secrets: Option<PathBuf>,
    pub token_cache: Option<PathBuf>,
}

/// On-disk config section (no secrets). Stored as config.toml.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    playlist_url: Option<String>,
    playlist_id: Option<String>,
    download_dir: Option<PathBuf>,
    download_tool: Option<String>,
    client_secrets_file: Option<PathBuf>,
    token_cache_file: Option<PathBuf>,
    scopes: Option<Vec<String>>,
    smtp_host: Option<String>,
    smtp_port: Option<u16>,
}

impl Config {
    /// Merge CLI overrides, the config file, and built-in defaults, then
    /// derive the playlist id from the URL if it was not given explicitly.
    pub fn load(overrides: Overrides) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("ytclear");
        Self::load_from(overrides, &config_dir)
    }

    fn load_from(overrides: Overrides, config_dir: &Path) -> Result<Self> {
        let file = load_file_config(&config_dir.join(CONFIG_FILE))?;

        let playlist_url = overrides.playlist_url.or(file.playlist_url);
        let playlist_id = overrides
            .playlist_id
            .or(file.playlist_id)
            .or_else(|| playlist_url.as_deref().and_then(playlist_id_from_url));

        Ok(Config {
            scopes: file
                .scopes
                .unwrap_or_else(|| vec![DEFAULT_SCOPE.to_string()]),
            client_secrets_file: overrides
                .client_secrets
                .or(file.client_secrets_file)
                .unwrap_or_else(|| config_dir.join("client_secret.json")),
            token_cache_file: overrides
                .token_cache
                .or(file.token_cache_file)
                .unwrap_or_else(|| config_dir.join("token.json")),
            playlist_url,
            playlist_id,
            download_dir: overrides
                .download_dir
                .or(file.download_dir)
                .unwrap_or_else(|| PathBuf::from("downloads")),
            download_tool: overrides
                .download_tool
                .or(file.download_tool)
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_TOOL.to_string()),
            notify: NotifySettings {
                email: env_var(ENV_NOTIFICATION_EMAIL),
                smtp_host: env_var(ENV_SMTP_HOST).or(file.smtp_host),
                smtp_port: env_var(ENV_SMTP_PORT)
                    .and_then(|v| v.parse().ok())
                    .or(file.smtp_port),
                smtp_username: env_var(ENV_SMTP_USERNAME),
                smtp_password: env_var(ENV_SMTP_PASSWORD),
            },
        })
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let config: FileConfig = toml::from_str(&contents)
        .with_context(|| format!("Could not parse {}", path.display()))?;
    Ok(config)
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Pull the playlist id out of a playlist URL's `list=` query parameter.
/// Unparsable URL or missing/empty parameter yields None.
pub fn playlist_id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "list")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
