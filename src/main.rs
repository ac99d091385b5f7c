use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod api;
mod auth;
mod cli;
mod config;
mod download;
mod error;
mod net;
mod notify;
mod storage;
mod workflow;

use config::{Config, Overrides};

#[derive(Parser)]
#[command(
    name = "ytclear",
    about = "Download a YouTube playlist's videos, then clear the playlist"
)]
struct Cli {
    /// Playlist URL; the playlist id is taken from its list= parameter
    #[arg(long, global = true)]
    playlist_url: Option<String>,

    /// Explicit playlist id (wins over the URL-derived one)
    #[arg(long, global = true)]
    playlist_id: Option<String>,

    /// Directory downloads are placed in
    #[arg(long, global = true)]
    download_dir: Option<PathBuf>,

    /// Download tool binary (default: yt-dlp)
    #[arg(long, global = true)]
    download_tool: Option<String>,

    /// Path to the OAuth client_secret.json
    #[arg(long, global = true)]
    client_secrets: Option<PathBuf>,

    /// Path to the cached token file
    #[arg(long, global = true)]
    token_cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download everything in the playlist, then delete all of its items
    Run {
        /// Delete without downloading first
        #[arg(long)]
        no_download: bool,
    },

    /// Print the playlist's items without changing anything
    List,

    /// Authenticate and cache a token without touching the playlist
    Auth,
}

fn main() {
    let cli = Cli::parse();

    let overrides = Overrides {
        playlist_url: cli.playlist_url,
        playlist_id: cli.playlist_id,
        download_dir: cli.download_dir,
        download_tool: cli.download_tool,
        client_secrets: cli.client_secrets,
        token_cache: cli.token_cache,
    };

    let result = Config::load(overrides).and_then(|config| match cli.command {
        Commands::Run { no_download } => cli::commands::cmd_run(config, !no_download),
        Commands::List => cli::commands::cmd_list(config),
        Commands::Auth => cli::commands::cmd_auth(config),
    });

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
