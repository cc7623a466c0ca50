//! Catalog data the purge engine reads.
//!
//! Storefront entities live in the shop's database; the engine only needs
//! store base URLs, entity store assignments and URL-key/rewrite data. The
//! [`Catalog`] trait is that contract. [`MemoryCatalog`] is a snapshot-backed
//! implementation loaded from TOML.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Default storefront, used when an entity is assigned to the admin scope.
pub const DEFAULT_STORE_ID: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: u32,
    #[serde(default)]
    pub code: String,
    /// Absolute base URL with trailing slash, e.g. `https://shop.example/`.
    pub base_url: String,
    /// Whether product URLs may include the category path.
    #[serde(default)]
    pub product_use_categories: bool,
}

impl Store {
    /// Store-scoped URL for an internal route, e.g. `catalog/product/view`.
    pub fn route_url(&self, route_path: &str, params: &[(&str, &str)]) -> String {
        let mut url = self.direct_url(route_path);
        for (key, value) in params {
            if value.is_empty() {
                continue;
            }
            url.push('/');
            url.push_str(key);
            url.push('/');
            url.push_str(value);
        }
        url.push('/');
        url
    }

    /// Store-scoped URL for a request path taken verbatim from a rewrite.
    pub fn direct_url(&self, request_path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), request_path.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    #[serde(default)]
    pub url_key: String,
    #[serde(default)]
    pub store_ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    #[serde(default)]
    pub url_key: String,
    #[serde(default)]
    pub store_ids: Vec<u32>,
    #[serde(default)]
    pub include_in_menu: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmsPage {
    pub id: u64,
    pub identifier: String,
    #[serde(default)]
    pub store_ids: Vec<u32>,
}

/// A stored friendly-path alias for an internal entity path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewrite {
    /// Entity path, e.g. `product/100` or `product/100/7`.
    pub id_path: String,
    /// Path relative to the store base URL.
    pub request_path: String,
    pub store_id: u32,
}

/// Read-only access to storefront entities.
///
/// Lookups return `Ok(None)` for unknown identifiers.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn stores(&self) -> Result<Vec<Store>, Error>;

    async fn store(&self, id: u32) -> Result<Option<Store>, Error>;

    async fn product(&self, id: u64) -> Result<Option<Product>, Error>;

    async fn category(&self, id: u64) -> Result<Option<Category>, Error>;

    async fn cms_page(&self, id: u64) -> Result<Option<CmsPage>, Error>;

    /// Rewrites whose id path equals `id_path` or starts with `id_path/`.
    async fn rewrites(&self, id_path: &str) -> Result<Vec<Rewrite>, Error>;
}

/// Catalog snapshot held in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryCatalog {
    #[serde(default)]
    pub stores: Vec<Store>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub pages: Vec<CmsPage>,
    #[serde(default)]
    pub rewrites: Vec<Rewrite>,
}

impl MemoryCatalog {
    /// # Errors
    ///
    /// Returns `Error::Catalog` if the document is not a valid catalog.
    pub fn from_toml_str(input: &str) -> Result<Self, Error> {
        toml::from_str(input).map_err(|e| Error::Catalog(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns `Error::Catalog` if the file cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let input = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Catalog(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&input)
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn stores(&self) -> Result<Vec<Store>, Error> {
        Ok(self.stores.clone())
    }

    async fn store(&self, id: u32) -> Result<Option<Store>, Error> {
        Ok(self.stores.iter().find(|s| s.id == id).cloned())
    }

    async fn product(&self, id: u64) -> Result<Option<Product>, Error> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    async fn category(&self, id: u64) -> Result<Option<Category>, Error> {
        Ok(self.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn cms_page(&self, id: u64) -> Result<Option<CmsPage>, Error> {
        Ok(self.pages.iter().find(|p| p.id == id).cloned())
    }

    async fn rewrites(&self, id_path: &str) -> Result<Vec<Rewrite>, Error> {
        let child_prefix = format!("{id_path}/");
        Ok(self
            .rewrites
            .iter()
            .filter(|r| r.id_path == id_path || r.id_path.starts_with(&child_prefix))
            .cloned()
            .collect())
    }
}
