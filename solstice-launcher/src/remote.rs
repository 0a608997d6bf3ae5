//! Distribution-server client: launcher config, instance list, news.
//!
//! One JSON config document drives the session (OAuth client id, online
//! flag, optional RSS feed); the instance list and news degrade to empty
//! on failure so a flaky CDN never blocks the launcher, but the config
//! itself is load-bearing and its failure is surfaced as a terminal
//! connection error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::models::Instance;
use crate::session::InstanceSource;

const CONFIG_PATH: &str = "launcher/config-launcher/config.json";
const NEWS_PATH: &str = "launcher/news-launcher/news.json";
const FILES_PATH: &str = "files";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("invalid distribution url: {0}")]
    Url(#[from] url::ParseError),
    #[error("distribution server not accessible: {0}")]
    Http(#[from] reqwest::Error),
    #[error("distribution server answered {0}")]
    Status(reqwest::StatusCode),
    #[error("news feed unreadable: {0}")]
    Feed(#[from] feed_rs::parser::ParseFeedError),
}

/// The launcher-wide config document served by the distribution server.
#[derive(Debug, Clone, Deserialize)]
pub struct LauncherRemoteConfig {
    pub client_id: String,
    #[serde(default)]
    pub online: bool,
    #[serde(default = "default_data_directory", rename = "dataDirectory")]
    pub data_directory: String,
    /// RSS feed url; when present it replaces the JSON news endpoint.
    #[serde(default)]
    pub rss: Option<String>,
}

fn default_data_directory() -> String {
    "solstice".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publish_date: String,
}

pub struct RemoteApi {
    client: reqwest::Client,
    base_url: Url,
}

impl RemoteApi {
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        // A trailing slash keeps Url::join from eating the last path segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: Url::parse(&normalized)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        Ok(self.base_url.join(path)?)
    }

    /// Fetch the launcher config. Failure here means the distribution
    /// server is unreachable, which the session treats as terminal.
    pub async fn launcher_config(&self) -> Result<LauncherRemoteConfig, RemoteError> {
        let response = self.client.get(self.endpoint(CONFIG_PATH)?).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// Fetch the instance list. An empty list is a valid answer and a
    /// fetch failure degrades to one.
    pub async fn instance_list(&self) -> Vec<Instance> {
        match self.try_instance_list().await {
            Ok(list) => list,
            Err(e) => {
                log::error!("[remote] Error fetching instances: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_instance_list(&self) -> Result<Vec<Instance>, RemoteError> {
        let response = self.client.get(self.endpoint(FILES_PATH)?).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }
        let map: serde_json::Map<String, serde_json::Value> = response.json().await?;
        Ok(flatten_instance_map(map))
    }

    /// Fetch news: the RSS feed when the remote config names one, the JSON
    /// endpoint otherwise. Failures degrade to no news.
    pub async fn news(&self, remote: &LauncherRemoteConfig) -> Vec<NewsItem> {
        if let Some(rss) = &remote.rss {
            return match self.try_rss_news(rss).await {
                Ok(items) => items,
                Err(e) => {
                    log::error!("[remote] Error fetching RSS news: {}", e);
                    Vec::new()
                }
            };
        }

        match self.try_json_news().await {
            Ok(items) => items,
            Err(e) => {
                log::error!("[remote] Error fetching JSON news: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_rss_news(&self, rss_url: &str) -> Result<Vec<NewsItem>, RemoteError> {
        let response = self.client.get(rss_url).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }
        let bytes = response.bytes().await?;
        let feed = feed_rs::parser::parse(&bytes[..])?;
        Ok(news_from_feed(feed))
    }

    async fn try_json_news(&self) -> Result<Vec<NewsItem>, RemoteError> {
        let response = self.client.get(self.endpoint(NEWS_PATH)?).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl InstanceSource for RemoteApi {
    async fn instances(&self) -> Vec<Instance> {
        self.instance_list().await
    }
}

/// The server publishes instances as a name-keyed map; flatten it into the
/// ordered list the rest of the launcher works with, names injected.
fn flatten_instance_map(map: serde_json::Map<String, serde_json::Value>) -> Vec<Instance> {
    let mut instances = Vec::new();
    for (name, value) in map {
        match serde_json::from_value::<Instance>(value) {
            Ok(mut instance) => {
                instance.name = name;
                instances.push(instance);
            }
            Err(e) => log::warn!("[remote] Skipping malformed instance `{}`: {}", name, e),
        }
    }
    instances
}

fn news_from_feed(feed: feed_rs::model::Feed) -> Vec<NewsItem> {
    feed.entries
        .into_iter()
        .map(|entry| {
            let title = entry
                .title
                .as_ref()
                .map(|t| html_escape::decode_html_entities(&t.content).into_owned())
                .unwrap_or_default();
            let author = entry
                .authors
                .first()
                .map(|a| a.name.clone())
                .unwrap_or_default();
            let publish_date = entry
                .published
                .or(entry.updated)
                .map(|d| d.to_rfc3339())
                .unwrap_or_default();
            let content = entry
                .content
                .and_then(|c| c.body)
                .or_else(|| entry.summary.map(|s| s.content))
                .unwrap_or_default();
            NewsItem {
                title,
                content,
                author,
                publish_date,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn instance_map_flattens_in_server_order_with_names() {
        let map = serde_json::from_value::<serde_json::Map<_, _>>(json!({
            "survival": { "whitelistActive": false },
            "staff": { "whitelistActive": true, "whitelist": ["Alex"] },
            "creative": {}
        }))
        .unwrap();

        let instances = flatten_instance_map(map);
        let names: Vec<&str> = instances.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["survival", "staff", "creative"]);
        assert!(instances[1].whitelist_active);
    }

    #[test]
    fn malformed_instances_are_skipped_not_fatal() {
        let map = serde_json::from_value::<serde_json::Map<_, _>>(json!({
            "broken": { "whitelistActive": "not-a-bool" },
            "fine": {}
        }))
        .unwrap();

        let instances = flatten_instance_map(map);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name, "fine");
    }

    #[test]
    fn rss_entries_become_news_items() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss version="2.0"><channel>
              <title>Server News</title>
              <item>
                <title>Season 4 &amp; the new spawn</title>
                <guid>post-1</guid>
                <description>The hub got rebuilt.</description>
                <author>mira</author>
                <pubDate>Mon, 03 Mar 2025 10:00:00 GMT</pubDate>
              </item>
            </channel></rss>"#;

        let feed = feed_rs::parser::parse(xml.as_bytes()).unwrap();
        let news = news_from_feed(feed);
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].title, "Season 4 & the new spawn");
        assert_eq!(news[0].content, "The hub got rebuilt.");
        assert!(!news[0].publish_date.is_empty());
    }

    #[test]
    fn remote_config_defaults_optional_fields() {
        let config: LauncherRemoteConfig = serde_json::from_value(json!({
            "client_id": "00000000-0000-0000-0000-000000000000"
        }))
        .unwrap();
        assert!(!config.online);
        assert!(config.rss.is_none());
        assert_eq!(config.data_directory, "solstice");
    }
}
