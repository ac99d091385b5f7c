use anyhow::{Context, Result};
use chrono::{Local, TimeZone};

use crate::auth::Authenticator;
use crate::config::Config;
use crate::notify::Notifier;
use crate::workflow::Workflow;

pub fn cmd_run(config: Config, download_first: bool) -> Result<()> {
    Workflow::new(config).run(download_first);
    Ok(())
}

pub fn cmd_list(config: Config) -> Result<()> {
    let playlist_id = config
        .playlist_id
        .clone()
        .context("No playlist id configured (set --playlist-id or --playlist-url)")?;

    let mut auth = Authenticator::new(&config);
    let client = auth.client()?;

    let listing = client.list_playlist_items(&playlist_id);
    if !listing.complete {
        eprintln!("Listing incomplete; a page fetch failed.");
    }

    for item in &listing.items {
        let channel = item
            .snippet
            .video_owner_channel_title
            .as_deref()
            .unwrap_or("(unknown channel)");
        println!("{}\t{}\t{}", channel, item.snippet.title, item.video_url());
    }
    eprintln!("{} videos in the playlist.", listing.items.len());

    Ok(())
}

pub fn cmd_auth(config: Config) -> Result<()> {
    let notifier = Notifier::new(config.notify.clone());
    if notifier.is_configured() {
        eprintln!("Email notification: enabled.");
    } else {
        eprintln!("Email notification: not configured; the authorization URL is only printed here.");
    }

    let auth = Authenticator::new(&config);
    let token = auth.token()?;

    let expires = Local
        .timestamp_opt(token.expires_at as i64, 0)
        .single()
        .map(|t| t.to_rfc2822())
        .unwrap_or_else(|| "unknown".to_string());
    eprintln!("Authenticated. Access token valid until {}.", expires);

    if token.refresh_token.is_none() {
        eprintln!("No refresh token stored; the next expiry needs an interactive re-authorization.");
    }

    Ok(())
}
