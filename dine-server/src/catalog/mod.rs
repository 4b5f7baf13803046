//! Menu catalog gateway
//!
//! The lifecycle engine only reads `{name, unit_price, available}` for an
//! item id at submission time; the price is snapshotted into the order and
//! never looked up again.

mod static_catalog;

pub use static_catalog::StaticCatalog;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Menu item as seen by the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub item_id: String,
    pub name: String,
    #[serde(alias = "price")]
    pub unit_price: Decimal,
    #[serde(default = "default_true")]
    pub available: bool,
}

fn default_true() -> bool {
    true
}

/// Catalog errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Menu item not found: {0}")]
    NotFound(String),

    #[error("Menu item unavailable: {0}")]
    Unavailable(String),

    /// Price outside `0..=MAX_PRICE`; the item cannot be ordered
    #[error("Menu item {item_id} has invalid price {price}")]
    InvalidPrice { item_id: String, price: String },

    /// Transient backend failure, the caller may retry
    #[error("Catalog backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait CatalogGateway: Send + Sync + std::fmt::Debug {
    /// Resolve an item id. Unavailable items are an error.
    async fn resolve(&self, item_id: &str) -> Result<CatalogItem, CatalogError>;
}

pub type DynCatalog = Arc<dyn CatalogGateway>;
