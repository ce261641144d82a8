//! Plex Media Server metadata provider.
//!
//! Talks to the server's JSON API for listings and item lookups and maps
//! each item's GUID to its metadata bundle on disk:
//!
//! ```text
//! <metadata_root>/<Movies|TV Shows>/<h[0]>/<h[1..]>.bundle   h = hex(sha1(guid))
//! ```

use super::{
    ItemDetails, ItemPage, ItemType, LibraryItem, LibrarySection, MetadataProvider,
};
use crate::config::{AppConfig, NetworkConfig};
use crate::error::{ArtkeepError, Result};
use crate::network::{with_retry, RetryPolicy};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

const TOKEN_HEADER: &str = "X-Plex-Token";
const CONTAINER_START_HEADER: &str = "X-Plex-Container-Start";
const CONTAINER_SIZE_HEADER: &str = "X-Plex-Container-Size";

/// Compute the metadata bundle directory for an item.
///
/// `item_type` is the raw Plex type string (`movie`, `show`, `season`, ...).
pub fn bundle_dir_for_guid(metadata_root: &Path, item_type: &str, guid: &str) -> PathBuf {
    let hash = hex::encode(Sha1::digest(guid.as_bytes()));
    let (head, tail) = hash.split_at(1);
    metadata_root
        .join(category_dir(item_type))
        .join(head)
        .join(format!("{}.bundle", tail))
}

fn category_dir(item_type: &str) -> &'static str {
    match item_type {
        "show" | "season" | "episode" => "TV Shows",
        "artist" => "Artists",
        "album" => "Albums",
        "collection" => "Collections",
        _ => "Movies",
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    media_container: T,
}

#[derive(Debug, Deserialize)]
struct SectionsContainer {
    #[serde(rename = "Directory", default)]
    directory: Vec<PlexDirectory>,
}

#[derive(Debug, Deserialize)]
struct PlexDirectory {
    key: String,
    title: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataContainer {
    #[serde(default)]
    total_size: Option<usize>,
    #[serde(rename = "Metadata", default)]
    metadata: Vec<PlexMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlexMetadata {
    rating_key: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    guid: Option<String>,
}

impl PlexMetadata {
    fn to_item(&self) -> LibraryItem {
        LibraryItem {
            rating_key: self.rating_key.clone(),
            title: self.title.clone(),
            item_type: ItemType::parse(&self.kind),
            year: self.year,
        }
    }
}

/// Metadata provider backed by a Plex Media Server.
pub struct PlexProvider {
    client: Client,
    base_url: Url,
    token: Option<String>,
    metadata_root: PathBuf,
    limiter: DefaultDirectRateLimiter,
    retry: RetryPolicy,
    sections: RwLock<Option<Vec<LibrarySection>>>,
}

impl PlexProvider {
    /// Create a provider for the server at `base_url`.
    ///
    /// `metadata_root` is the server's `Metadata` directory as seen from this
    /// machine.
    pub fn new(
        base_url: &str,
        token: Option<String>,
        metadata_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| ArtkeepError::Config {
            message: format!("Invalid Plex URL '{}': {}", base_url, e),
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(NetworkConfig::REQUEST_TIMEOUT)
            .user_agent(AppConfig::USER_AGENT)
            .build()
            .map_err(|e| ArtkeepError::Config {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let per_second =
            NonZeroU32::new(NetworkConfig::REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            base_url,
            token: token.filter(|t| !t.is_empty()),
            metadata_root: metadata_root.into(),
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
            retry: RetryPolicy::default(),
            sections: RwLock::new(None),
        })
    }

    /// Override the retry policy for idempotent requests.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn metadata_root(&self) -> &Path {
        &self.metadata_root
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(path).map_err(|e| ArtkeepError::Config {
            message: format!("Invalid request path '{}': {}", path, e),
        })?;
        let mut builder = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        Ok(builder)
    }

    /// Send one request, mapping HTTP status to the error taxonomy.
    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        self.limiter.until_ready().await;

        let response = builder
            .send()
            .await
            .map_err(|e| ArtkeepError::UpstreamUnavailable {
                message: format!("{} failed: {}", what, e),
                source: Some(e),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(match status {
            StatusCode::NOT_FOUND => ArtkeepError::not_found(format!("{} returned 404", what)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ArtkeepError::Config {
                message: format!("{} was rejected ({}); check the Plex token", what, status),
            },
            s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
                ArtkeepError::UpstreamUnavailable {
                    message: format!("{} returned {}", what, s),
                    source: None,
                }
            }
            s => ArtkeepError::Other(format!("{} returned {}", what, s)),
        })
    }

    /// GET a JSON document, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        headers: &[(&'static str, String)],
    ) -> Result<T> {
        let what = format!("GET /{}", path);
        let what = what.as_str();
        with_retry(&self.retry, what, || async move {
            let mut builder = self.request(Method::GET, path)?;
            for (name, value) in headers {
                builder = builder.header(*name, value.as_str());
            }
            let response = self.send(builder, what).await?;
            let body = response.bytes().await.map_err(|e| ArtkeepError::UpstreamUnavailable {
                message: format!("{} body: {}", what, e),
                source: Some(e),
            })?;
            Ok(serde_json::from_slice::<T>(&body)?)
        })
        .await
    }

    async fn section_key(&self, library: &str) -> Result<String> {
        if let Some(sections) = self.sections.read().await.as_ref() {
            if let Some(s) = sections.iter().find(|s| s.title == library) {
                return Ok(s.key.clone());
            }
        }
        // Unknown or not cached yet: reload once.
        let sections = self.fetch_sections().await?;
        let key = sections
            .iter()
            .find(|s| s.title == library)
            .map(|s| s.key.clone());
        *self.sections.write().await = Some(sections);
        key.ok_or_else(|| ArtkeepError::not_found(format!("Library '{}' not found", library)))
    }

    async fn fetch_sections(&self) -> Result<Vec<LibrarySection>> {
        let envelope: Envelope<SectionsContainer> =
            self.get_json("library/sections", &[]).await?;
        Ok(envelope
            .media_container
            .directory
            .into_iter()
            .map(|d| LibrarySection {
                key: d.key,
                title: d.title,
                section_type: d.kind,
            })
            .collect())
    }
}

#[async_trait]
impl MetadataProvider for PlexProvider {
    async fn get_item(&self, rating_key: &str) -> Result<ItemDetails> {
        let path = format!("library/metadata/{}", rating_key);
        let envelope: Envelope<MetadataContainer> = self.get_json(&path, &[]).await?;
        let metadata = envelope
            .media_container
            .metadata
            .into_iter()
            .next()
            .ok_or_else(|| ArtkeepError::not_found(format!("Item {} not found", rating_key)))?;

        let guid = metadata.guid.as_deref().ok_or_else(|| {
            ArtkeepError::not_found(format!("Item {} has no GUID", rating_key))
        })?;
        let base_dir = bundle_dir_for_guid(&self.metadata_root, &metadata.kind, guid);
        debug!("Item {} bundle at {}", rating_key, base_dir.display());

        Ok(ItemDetails {
            item: metadata.to_item(),
            base_dir,
        })
    }

    async fn refresh(&self, rating_key: &str) -> Result<()> {
        let what = format!("PUT /library/metadata/{}/refresh", rating_key);
        let builder = self.request(
            Method::PUT,
            &format!("library/metadata/{}/refresh", rating_key),
        )?;
        self.send(builder, &what).await?;
        Ok(())
    }

    async fn list_items(&self, library: &str, offset: usize, limit: usize) -> Result<ItemPage> {
        let key = self.section_key(library).await?;
        let path = format!("library/sections/{}/all", key);
        let envelope: Envelope<MetadataContainer> = self
            .get_json(
                &path,
                &[
                    (CONTAINER_START_HEADER, offset.to_string()),
                    (CONTAINER_SIZE_HEADER, limit.to_string()),
                ],
            )
            .await?;

        let container = envelope.media_container;
        let total_size = listing_total(
            container.total_size,
            offset,
            limit,
            container.metadata.len(),
        );
        Ok(ItemPage {
            items: container.metadata.iter().map(PlexMetadata::to_item).collect(),
            total_size,
        })
    }

    async fn libraries(&self) -> Result<Vec<LibrarySection>> {
        let sections = self.fetch_sections().await?;
        *self.sections.write().await = Some(sections.clone());
        Ok(sections)
    }
}

/// Library size for a listing page. Without `totalSize` only a short page
/// tells where the library ends.
fn listing_total(
    reported: Option<usize>,
    offset: usize,
    limit: usize,
    returned: usize,
) -> Option<usize> {
    reported.or_else(|| (returned < limit).then_some(offset + returned))
}
