//! In-memory catalog loaded from a JSON menu file

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::{CatalogError, CatalogGateway, CatalogItem};

/// In-memory catalog
///
/// Menu file format:
///
/// ```json
/// [
///   { "item_id": "paneer-tikka", "name": "Paneer Tikka", "unit_price": "100.00" },
///   { "item_id": "lassi", "name": "Lassi", "price": 50, "available": false }
/// ]
/// ```
#[derive(Clone, Default)]
pub struct StaticCatalog {
    items: Arc<RwLock<HashMap<String, CatalogItem>>>,
}

impl std::fmt::Debug for StaticCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCatalog")
            .field("items", &self.items.read().len())
            .finish()
    }
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let catalog = Self::new();
        for item in items {
            catalog.upsert(item);
        }
        catalog
    }

    /// Load a JSON menu file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Backend(format!("{}: {}", path.display(), e)))?;
        let items: Vec<CatalogItem> = serde_json::from_str(&raw)
            .map_err(|e| CatalogError::Backend(format!("{}: {}", path.display(), e)))?;

        let catalog = Self::from_items(items);
        tracing::info!(path = %path.display(), items = catalog.len(), "Menu loaded");
        Ok(catalog)
    }

    /// Insert or replace an item (menu edits, price changes)
    pub fn upsert(&self, item: CatalogItem) {
        self.items.write().insert(item.item_id.clone(), item);
    }

    pub fn set_available(&self, item_id: &str, available: bool) -> bool {
        match self.items.write().get_mut(item_id) {
            Some(item) => {
                item.available = available;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, item_id: &str) -> Option<CatalogItem> {
        self.items.write().remove(item_id)
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl CatalogGateway for StaticCatalog {
    async fn resolve(&self, item_id: &str) -> Result<CatalogItem, CatalogError> {
        let item = self
            .items
            .read()
            .get(item_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(item_id.to_string()))?;
        if !item.available {
            return Err(CatalogError::Unavailable(item_id.to_string()));
        }
        Ok(item)
    }
}
