//! URL resolution for purges.
//!
//! Maps a changed entity to every URL an edge node may have cached a
//! response under: the store-scoped canonical route URL for each assigned
//! store, plus every rewrite alias on the rewrite's own store host.
//!
//! Unknown entities and catalog failures resolve to no URLs. Store wildcards
//! are the exception: a failed store lookup is reported to the caller.

use crate::Error;
use crate::catalog::{Catalog, DEFAULT_STORE_ID, Rewrite, Store};
use crate::tags::{ChangeTag, TagKind};

const PRODUCT_ROUTE: &str = "catalog/product/view";
const CATEGORY_ROUTE: &str = "catalog/category/view";
const CMS_PAGE_ROUTE: &str = "cms/page/view";

/// Suffix that turns a base URL into a purge-everything target.
pub const WILDCARD_SUFFIX: &str = "/.*";

/// Resolves change tags into candidate purge URLs.
pub struct UrlResolver<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: Catalog + ?Sized> UrlResolver<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Candidate URLs for one tag, duplicates included.
    pub async fn urls_for(&self, tag: ChangeTag) -> Vec<String> {
        match tag.kind {
            TagKind::Product => self.product_urls(tag.id).await,
            TagKind::Category => self.category_urls(tag.id).await,
            TagKind::Page => self.cms_page_urls(tag.id).await,
        }
    }

    pub async fn product_urls(&self, id: u64) -> Vec<String> {
        let product = match self.catalog.product(id).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                tracing::debug!(product_id = id, "product not found, nothing to purge");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(product_id = id, error = %e, "failed to load product");
                return Vec::new();
            }
        };

        let id_str = product.id.to_string();
        let params = [("id", id_str.as_str()), ("s", product.url_key.as_str())];
        let mut urls = self.canonical_urls(&product.store_ids, PRODUCT_ROUTE, &params).await;

        let id_path = format!("product/{}", product.id);
        for rewrite in self.load_rewrites(&id_path).await {
            let Some(store) = self.load_store(rewrite.store_id).await else {
                continue;
            };
            if rewrite.id_path != id_path && !store.product_use_categories {
                continue;
            }
            urls.push(store.direct_url(&rewrite.request_path));
        }

        urls
    }

    pub async fn category_urls(&self, id: u64) -> Vec<String> {
        let category = match self.catalog.category(id).await {
            Ok(Some(category)) => category,
            Ok(None) => {
                tracing::debug!(category_id = id, "category not found, nothing to purge");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(category_id = id, error = %e, "failed to load category");
                return Vec::new();
            }
        };

        let id_str = category.id.to_string();
        let params = [("id", id_str.as_str()), ("s", category.url_key.as_str())];
        let mut urls = self.canonical_urls(&category.store_ids, CATEGORY_ROUTE, &params).await;

        let id_path = format!("category/{}", category.id);
        for rewrite in self.load_rewrites(&id_path).await {
            if rewrite.id_path != id_path {
                continue;
            }
            if let Some(store) = self.load_store(rewrite.store_id).await {
                urls.push(store.direct_url(&rewrite.request_path));
            }
        }

        urls
    }

    /// Canonical page URL per store plus the bare `http://<host>/<identifier>` form.
    pub async fn cms_page_urls(&self, id: u64) -> Vec<String> {
        let page = match self.catalog.cms_page(id).await {
            Ok(Some(page)) => page,
            Ok(None) => {
                tracing::debug!(page_id = id, "CMS page not found, nothing to purge");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(page_id = id, error = %e, "failed to load CMS page");
                return Vec::new();
            }
        };

        let store_ids = if page.store_ids.is_empty() { vec![DEFAULT_STORE_ID] } else { page.store_ids.clone() };
        let id_str = page.id.to_string();

        let mut urls = Vec::new();
        for store_id in store_ids {
            let Some(store) = self.load_store(scoped_store_id(store_id)).await else {
                continue;
            };
            let canonical = store.route_url(CMS_PAGE_ROUTE, &[("id", id_str.as_str())]);
            let host = url::Url::parse(&canonical)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string));
            urls.push(canonical);
            if let Some(host) = host {
                urls.push(format!("http://{host}/{}", page.identifier));
            }
        }

        urls
    }

    /// One purge-everything target per distinct store base URL.
    ///
    /// # Errors
    ///
    /// Returns the catalog error when the store list cannot be loaded.
    pub async fn store_wildcards(&self) -> Result<Vec<String>, Error> {
        let stores = self.catalog.stores().await?;

        let mut targets: Vec<String> = Vec::new();
        for store in stores {
            let target = format!("{}{WILDCARD_SUFFIX}", store.base_url.trim_end_matches('/'));
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        Ok(targets)
    }

    async fn canonical_urls(&self, store_ids: &[u32], route_path: &str, params: &[(&str, &str)]) -> Vec<String> {
        let mut urls = Vec::new();
        for &store_id in store_ids {
            if let Some(store) = self.load_store(scoped_store_id(store_id)).await {
                urls.push(store.route_url(route_path, params));
            }
        }
        urls
    }

    async fn load_store(&self, id: u32) -> Option<Store> {
        match self.catalog.store(id).await {
            Ok(Some(store)) => Some(store),
            Ok(None) => {
                tracing::debug!(store_id = id, "unknown store, skipping URL");
                None
            }
            Err(e) => {
                tracing::warn!(store_id = id, error = %e, "failed to load store");
                None
            }
        }
    }

    async fn load_rewrites(&self, id_path: &str) -> Vec<Rewrite> {
        self.catalog.rewrites(id_path).await.unwrap_or_else(|e| {
            tracing::warn!(id_path, error = %e, "failed to load rewrites");
            Vec::new()
        })
    }
}

/// The admin scope (store 0) has no frontend; its URLs live on the default store.
fn scoped_store_id(store_id: u32) -> u32 {
    if store_id == 0 { DEFAULT_STORE_ID } else { store_id }
}
