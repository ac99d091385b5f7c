use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::api::PlaylistItem;
use crate::config::Config;
use crate::net;

// Prefer up to 1080p video+audio, fall back to the best single stream <=1080p.
const FORMAT_SELECTOR: &str = "bestvideo[height<=1080]+bestaudio/best[height<=1080]";

/// Invokes the external download tool once per item. Every invocation is
/// independent; failures are logged and the loop moves on.
pub struct Downloader {
    playlist_url: Option<String>,
    download_dir: PathBuf,
    tool: String,
}

impl Downloader {
    pub fn new(config: &Config) -> Self {
        Self {
            playlist_url: config.playlist_url.clone(),
            download_dir: config.download_dir.clone(),
            tool: config.download_tool.clone(),
        }
    }

    /// Download every item, gated on configuration and connectivity.
    /// Returns the number of items that failed.
    pub fn download(&self, items: &[PlaylistItem]) -> usize {
        if self.playlist_url.is_none() {
            eprintln!("No playlist URL configured; skipping download.");
            return 0;
        }

        if !net::check_internet_connection() {
            eprintln!("No internet connection available. Skipping download.");
            return 0;
        }

        if let Err(e) = fs::create_dir_all(&self.download_dir) {
            eprintln!(
                "Could not create download directory {}: {}",
                self.download_dir.display(),
                e
            );
            return items.len();
        }

        self.download_items(items)
    }

    fn download_items(&self, items: &[PlaylistItem]) -> usize {
        let template = output_template(&self.download_dir);
        let mut failures = 0;

        for item in items {
            let video_url = item.video_url();
            eprintln!(" - {} ({})", item.snippet.title, video_url);

            // Argument-vector invocation; no shell sees the title or URL.
            let status = Command::new(&self.tool)
                .arg("-f")
                .arg(FORMAT_SELECTOR)
                .arg("-o")
                .arg(&template)
                .arg("--restrict-filenames")
                .arg(&video_url)
                .status();

            match status {
                Ok(status) if status.success() => {
                    eprintln!("Download completed successfully.");
                }
                Ok(status) => {
                    eprintln!("{} exited with {}", self.tool, status);
                    failures += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    eprintln!("{} not found on PATH.", self.tool);
                    failures += 1;
                }
                Err(e) => {
                    eprintln!("Failed to run {}: {}", self.tool, e);
                    failures += 1;
                }
            }
        }

        failures
    }
}

/// yt-dlp output template: one directory per channel, video title as the
/// filename. The %(...)s placeholders are expanded by the tool itself.
fn output_template(download_dir: &Path) -> PathBuf {
    download_dir.join("%(channel)s").join("%(title)s.%(ext)s")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ResourceId, Snippet};

    fn test_item() -> PlaylistItem {
        PlaylistItem {
            id: "item-1".to_string(),
            snippet: Snippet {
                title: "A Video".to_string(),
                video_owner_channel_title: Some("Channel".to_string()),
                resource_id: ResourceId {
                    video_id: "abc123".to_string(),
                },
            },
        }
    }

    #[test]
    fn template_nests_channel_under_download_dir() {
        let template = output_template(Path::new("downloads"));
        assert_eq!(
            template,
            Path::new("downloads").join("%(channel)s").join("%(title)s.%(ext)s")
        );
    }

    #[test]
    fn missing_tool_is_counted_not_fatal() {
        let downloader = Downloader {
            playlist_url: Some("https://www.youtube.com/playlist?list=PL1".to_string()),
            download_dir: std::env::temp_dir(),
            tool: "ytclear-test-no-such-tool".to_string(),
        };
        let failures = downloader.download_items(&[test_item(), test_item()]);
        assert_eq!(failures, 2);
    }

    #[test]
    fn no_playlist_url_skips_without_touching_the_tool() {
        let downloader = Downloader {
            playlist_url: None,
            download_dir: PathBuf::from("downloads"),
            tool: "ytclear-test-no-such-tool".to_string(),
        };
        assert_eq!(downloader.download(&[test_item()]), 0);
    }
}
