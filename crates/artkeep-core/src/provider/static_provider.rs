//! In-memory metadata provider.
//!
//! Serves a fixed catalog. Used by tests and by embedders that already know
//! where their item bundles live.

use super::{
    ItemDetails, ItemPage, ItemType, LibraryItem, LibrarySection, MetadataProvider,
};
use crate::error::{ArtkeepError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

#[derive(Default)]
struct Catalog {
    /// Library title -> rating keys in listing order.
    libraries: Vec<(String, Vec<String>)>,
    items: HashMap<String, ItemDetails>,
}

/// Metadata provider backed by an in-memory catalog.
#[derive(Default)]
pub struct StaticProvider {
    catalog: RwLock<Catalog>,
    refreshed: Mutex<Vec<String>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item to `library`, creating the library on first use.
    pub fn insert(
        &self,
        library: &str,
        rating_key: impl Into<String>,
        title: impl Into<String>,
        item_type: ItemType,
        base_dir: impl Into<PathBuf>,
    ) {
        let rating_key = rating_key.into();
        let details = ItemDetails {
            item: LibraryItem {
                rating_key: rating_key.clone(),
                title: title.into(),
                item_type,
                year: None,
            },
            base_dir: base_dir.into(),
        };

        let mut catalog = match self.catalog.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match catalog.libraries.iter_mut().find(|(name, _)| name == library) {
            Some((_, keys)) => keys.push(rating_key.clone()),
            None => catalog
                .libraries
                .push((library.to_string(), vec![rating_key.clone()])),
        }
        catalog.items.insert(rating_key, details);
    }

    /// Rating keys passed to [`MetadataProvider::refresh`], in call order.
    pub fn refreshed(&self) -> Vec<String> {
        match self.refreshed.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Catalog> {
        match self.catalog.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl MetadataProvider for StaticProvider {
    async fn get_item(&self, rating_key: &str) -> Result<ItemDetails> {
        self.read()
            .items
            .get(rating_key)
            .cloned()
            .ok_or_else(|| ArtkeepError::not_found(format!("Item {} not found", rating_key)))
    }

    async fn refresh(&self, rating_key: &str) -> Result<()> {
        if !self.read().items.contains_key(rating_key) {
            return Err(ArtkeepError::not_found(format!(
                "Item {} not found",
                rating_key
            )));
        }
        match self.refreshed.lock() {
            Ok(mut guard) => guard.push(rating_key.to_string()),
            Err(poisoned) => poisoned.into_inner().push(rating_key.to_string()),
        }
        Ok(())
    }

    async fn list_items(&self, library: &str, offset: usize, limit: usize) -> Result<ItemPage> {
        let catalog = self.read();
        let (_, keys) = catalog
            .libraries
            .iter()
            .find(|(name, _)| name == library)
            .ok_or_else(|| ArtkeepError::not_found(format!("Library '{}' not found", library)))?;

        let items = keys
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|key| catalog.items.get(key).map(|d| d.item.clone()))
            .collect();

        Ok(ItemPage {
            items,
            total_size: Some(keys.len()),
        })
    }

    async fn libraries(&self) -> Result<Vec<LibrarySection>> {
        Ok(self
            .read()
            .libraries
            .iter()
            .enumerate()
            .map(|(i, (name, _))| LibrarySection {
                key: (i + 1).to_string(),
                title: name.clone(),
                section_type: "static".to_string(),
            })
            .collect())
    }
}
