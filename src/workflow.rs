use anyhow::Result;

use crate::api::{Listing, PlaylistItem, YouTubeClient};
use crate::auth::Authenticator;
use crate::config::Config;
use crate::download::Downloader;
use crate::error::Error;
use crate::net;

/// High-level workflow: optionally download, then delete items from the
/// playlist.
pub struct Workflow {
    config: Config,
    auth: Authenticator,
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        let auth = Authenticator::new(&config);
        Self { config, auth }
    }

    /// One full invocation. Item-level failures are logged inside the
    /// individual steps; only connectivity loss or an unclassified error
    /// aborts, and both are reported here instead of propagating.
    pub fn run(&mut self, download_first: bool) {
        if !net::check_internet_connection() {
            eprintln!(
                "No internet connection available. Please check your connection and try again."
            );
            return;
        }

        if let Err(e) = self.try_run(download_first) {
            if e.downcast_ref::<Error>().is_some() {
                eprintln!("Network error: {}", e);
            } else {
                eprintln!("An unexpected error occurred: {:?}", e);
            }
        }
    }

    fn try_run(&mut self, download_first: bool) -> Result<()> {
        let client = self.auth.client()?;
        let config = &self.config;
        sync(client, config, download_first, &mut |items| {
            Downloader::new(config).download(items);
        })
    }
}

/// Post-authentication half of a run: read the playlist, optionally hand
/// every item to `download`, then delete. The download pass runs strictly
/// before any delete call; deleting first would make the items
/// unrecoverable for download.
fn sync(
    client: &YouTubeClient,
    config: &Config,
    download_first: bool,
    download: &mut dyn FnMut(&[PlaylistItem]),
) -> Result<()> {
    let listing = match config.playlist_id.as_deref() {
        Some(id) => client.list_playlist_items(id),
        None => Listing {
            items: Vec::new(),
            complete: true,
        },
    };

    if listing.complete {
        eprintln!("Found {} videos in the playlist.", listing.items.len());
    } else {
        eprintln!(
            "Found {} videos in the playlist (listing incomplete; a page fetch failed).",
            listing.items.len()
        );
    }

    if download_first && config.playlist_url.is_some() {
        download(&listing.items);
    }

    if config.playlist_id.is_none() {
        eprintln!("No playlist id configured; aborting deletion.");
        return Ok(());
    }

    if listing.items.is_empty() {
        eprintln!("Playlist is already empty.");
    } else {
        let failures = client.delete_items(&listing.items);
        if failures == 0 {
            eprintln!("All videos deleted from the playlist.");
        } else {
            eprintln!(
                "Deleted {} of {} videos; {} failed.",
                listing.items.len() - failures,
                listing.items.len(),
                failures
            );
        }
    }

    Ok(())
}
