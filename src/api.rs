use anyhow::Result;
use serde::Deserialize;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

// The API caps playlistItems.list at 50 results per call.
const PAGE_SIZE: &str = "50";

/// Thin client for the two playlist endpoints this tool needs: paginated
/// listing and per-item deletion.
pub struct YouTubeClient {
    http: reqwest::blocking::Client,
    base_url: String,
    access_token: String,
}

/// One playlist entry. The top-level id names the membership record (used
/// for deletion); the snippet describes the underlying video.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    pub id: String,
    pub snippet: Snippet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,
    #[serde(default)]
    pub video_owner_channel_title: Option<String>,
    pub resource_id: ResourceId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub video_id: String,
}

impl PlaylistItem {
    pub fn video_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.snippet.video_id())
    }
}

impl Snippet {
    fn video_id(&self) -> &str {
        &self.resource_id.video_id
    }
}

/// Result of one full paginated read. `complete` is false when a page fetch
/// failed and the items are only the prefix accumulated before the failure,
/// so an empty incomplete listing is distinguishable from an empty playlist.
#[derive(Debug)]
pub struct Listing {
    pub items: Vec<PlaylistItem>,
    pub complete: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

impl YouTubeClient {
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(access_token, API_BASE.to_string())
    }

    /// Point the client at a different API host. Tests use this to talk to
    /// a local fake server.
    pub fn with_base_url(access_token: String, base_url: String) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url,
            access_token,
        }
    }

    /// Retrieve all items in the playlist, following continuation cursors
    /// until the server stops returning one. A failed page fetch is logged
    /// and ends the read with whatever was accumulated so far.
    pub fn list_playlist_items(&self, playlist_id: &str) -> Listing {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(format!("{}/playlistItems", self.base_url))
                .bearer_auth(&self.access_token)
                .query(&[
                    ("part", "id,snippet"),
                    ("maxResults", PAGE_SIZE),
                    ("playlistId", playlist_id),
                ]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: PlaylistItemsPage = match request
                .send()
                .and_then(|resp| resp.error_for_status())
                .and_then(|resp| resp.json())
            {
                Ok(page) => page,
                Err(e) => {
                    eprintln!("Failed to retrieve playlist items: {}", e);
                    return Listing {
                        items,
                        complete: false,
                    };
                }
            };

            items.extend(page.items);

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Listing {
            items,
            complete: true,
        }
    }

    /// Delete the given items one call at a time, continuing past individual
    /// failures. Returns the number of deletions that failed.
    pub fn delete_items(&self, items: &[PlaylistItem]) -> usize {
        let mut failures = 0;

        for item in items {
            eprintln!("Deleting: {} (item id {})", item.snippet.title, item.id);
            if let Err(e) = self.delete_playlist_item(&item.id) {
                eprintln!("Failed to delete item {}: {}", item.id, e);
                failures += 1;
            }
        }

        failures
    }

    fn delete_playlist_item(&self, item_id: &str) -> Result<()> {
        self.http
            .delete(format!("{}/playlistItems", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("id", item_id)])
            .send()?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    use tiny_http::{Response, Server};

    fn item_json(item_id: &str, title: &str, video_id: &str) -> String {
        format!(
            r#"{{"id":"{}","snippet":{{"title":"{}","videoOwnerChannelTitle":"Some Channel","resourceId":{{"videoId":"{}"}}}}}}"#,
            item_id, title, video_id
        )
    }

    fn test_item(item_id: &str) -> PlaylistItem {
        PlaylistItem {
            id: item_id.to_string(),
            snippet: Snippet {
                title: format!("video {}", item_id),
                video_owner_channel_title: Some("Some Channel".to_string()),
                resource_id: ResourceId {
                    video_id: format!("v-{}", item_id),
                },
            },
        }
    }

    /// Fake API server answering a fixed number of requests with
    /// caller-chosen (status, body) pairs, in request order.
    fn spawn_server(responses: Vec<(u16, String)>) -> (String, thread::JoinHandle<Vec<String>>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();

        let handle = thread::spawn(move || {
            let mut seen_urls = Vec::new();
            for (status, body) in responses {
                let request = server.recv().unwrap();
                seen_urls.push(request.url().to_string());
                let response = Response::from_string(body).with_status_code(status);
                request.respond(response).unwrap();
            }
            seen_urls
        });

        (format!("http://127.0.0.1:{}", port), handle)
    }

    #[test]
    fn pagination_preserves_order_and_stops_without_cursor() {
        let page1 = format!(
            r#"{{"items":[{},{}],"nextPageToken":"cursor-2"}}"#,
            item_json("i1", "first", "v1"),
            item_json("i2", "second", "v2"),
        );
        let page2 = format!(r#"{{"items":[{}]}}"#, item_json("i3", "third", "v3"));

        let (base, handle) = spawn_server(vec![(200, page1), (200, page2)]);
        let client = YouTubeClient::with_base_url("test-token".to_string(), base);

        let listing = client.list_playlist_items("PLtest");
        let urls = handle.join().unwrap();

        assert!(listing.complete);
        let ids: Vec<&str> = listing.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["i1", "i2", "i3"]);

        assert!(!urls[0].contains("pageToken"));
        assert!(urls[1].contains("pageToken=cursor-2"));
        assert!(urls.iter().all(|u| u.contains("playlistId=PLtest")));
    }

    #[test]
    fn failed_page_returns_accumulated_prefix() {
        let page1 = format!(
            r#"{{"items":[{}],"nextPageToken":"cursor-2"}}"#,
            item_json("i1", "first", "v1"),
        );

        let (base, handle) = spawn_server(vec![(200, page1), (500, String::new())]);
        let client = YouTubeClient::with_base_url("test-token".to_string(), base);

        let listing = client.list_playlist_items("PLtest");
        handle.join().unwrap();

        assert!(!listing.complete);
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].id, "i1");
    }

    #[test]
    fn empty_playlist_reads_as_complete_and_empty() {
        let (base, handle) = spawn_server(vec![(200, r#"{"items":[]}"#.to_string())]);
        let client = YouTubeClient::with_base_url("test-token".to_string(), base);

        let listing = client.list_playlist_items("PLtest");
        handle.join().unwrap();

        assert!(listing.complete);
        assert!(listing.items.is_empty());
    }

    #[test]
    fn deletion_continues_past_individual_failures() {
        let items = vec![test_item("d1"), test_item("d2"), test_item("d3")];

        let responses = vec![
            (200, String::new()),
            (404, String::new()),
            (200, String::new()),
        ];
        let (base, handle) = spawn_server(responses);
        let client = YouTubeClient::with_base_url("test-token".to_string(), base);

        let failures = client.delete_items(&items);
        let urls = handle.join().unwrap();

        assert_eq!(failures, 1);
        assert_eq!(urls.len(), 3);
        assert!(urls[0].contains("id=d1"));
        assert!(urls[1].contains("id=d2"));
        assert!(urls[2].contains("id=d3"));
    }

    #[test]
    fn video_url_points_at_watch_page() {
        let item = test_item("i1");
        assert_eq!(item.video_url(), "https://www.youtube.com/watch?v=v-i1");
    }
}
