//! Metadata provider capability.
//!
//! The core never talks to a media server directly. Everything it needs
//! about an item (title, type, where its bundle lives on disk) comes through
//! [`MetadataProvider`].

mod plex;
mod static_provider;

pub use plex::{bundle_dir_for_guid, PlexProvider};
pub use static_provider::StaticProvider;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Item type as reported by the media server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Movie,
    Show,
    Season,
    /// Episodes, artists and anything else; resolved like a movie.
    Other,
}

impl ItemType {
    pub fn parse(s: &str) -> Self {
        match s {
            "movie" => ItemType::Movie,
            "show" => ItemType::Show,
            "season" => ItemType::Season,
            _ => ItemType::Other,
        }
    }

    /// Whether season posters may exist under this item's bundle.
    pub fn has_seasons(&self) -> bool {
        matches!(self, ItemType::Show)
    }
}

/// One entry of a library listing. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryItem {
    pub rating_key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
}

/// An item plus the directory its artwork bundle lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDetails {
    pub item: LibraryItem,
    pub base_dir: PathBuf,
}

/// A window of a library listing.
#[derive(Debug, Clone, Default)]
pub struct ItemPage {
    pub items: Vec<LibraryItem>,
    /// Size of the whole library, independent of the window. `None` when
    /// the provider cannot tell.
    pub total_size: Option<usize>,
}

/// A library (Plex "section") exposed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySection {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub section_type: String,
}

/// Source of item metadata and bundle locations.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Look up one item. Unknown keys fail with `NotFound`.
    async fn get_item(&self, rating_key: &str) -> Result<ItemDetails>;

    /// Ask the server to re-read an item's artwork. Best-effort.
    async fn refresh(&self, rating_key: &str) -> Result<()>;

    /// List `limit` items of `library` starting at `offset`.
    ///
    /// Unknown libraries fail with `NotFound`.
    async fn list_items(&self, library: &str, offset: usize, limit: usize) -> Result<ItemPage>;

    async fn libraries(&self) -> Result<Vec<LibrarySection>>;
}
