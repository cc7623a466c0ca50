//! invalidate, purge-all and category-saved command implementations.
//!
//! Each loads the catalog snapshot named by `catalog_path` and runs the
//! invalidation orchestrator against the configured edge nodes.

use clap::Args;
use serde::{Deserialize, Serialize};
use shopedge_client::{AdminNotice, Invalidator};
use shopedge_core::{AppConfig, Catalog, ChangeTag, MemoryCatalog};

/// Arguments for the invalidate command.
#[derive(Debug, Clone, Default, Args)]
pub struct InvalidateArgs {
    /// Change tag such as catalog_product_100, catalog_category_7 or cms_page_3.
    /// Repeatable; without tags every storefront is purged.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

/// Output from the invalidate and purge-all commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidateOutput {
    /// Tags that named a purgeable entity.
    pub recognised_tags: Vec<String>,
    /// Whether any purge was dispatched.
    pub dispatched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<AdminNotice>,
}

/// Arguments for the category-saved command.
#[derive(Debug, Clone, Args)]
pub struct CategorySavedArgs {
    /// Identifier of the saved category.
    #[arg(long)]
    pub id: u64,
}

/// Output from the category-saved command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySavedOutput {
    pub category_id: u64,
    /// Whether the whole edge cache should be refreshed.
    pub refresh_required: bool,
}

async fn load_catalog(config: &AppConfig) -> anyhow::Result<MemoryCatalog> {
    Ok(MemoryCatalog::load(config.require_catalog_path()?).await?)
}

async fn invalidator(config: &AppConfig) -> anyhow::Result<Invalidator<MemoryCatalog>> {
    Ok(Invalidator::from_config(config, load_catalog(config).await?))
}

/// Implementation of the invalidate command.
pub async fn invalidate_impl(config: &AppConfig, args: InvalidateArgs) -> anyhow::Result<InvalidateOutput> {
    let invalidator = invalidator(config).await?;
    let recognised_tags = ChangeTag::parse_all(&args.tags).iter().map(ToString::to_string).collect();

    let notice = invalidator.on_clean_cache(&args.tags).await;

    Ok(InvalidateOutput { recognised_tags, dispatched: notice.is_some(), notice })
}

/// Implementation of the purge-all command.
pub async fn purge_all_impl(config: &AppConfig) -> anyhow::Result<InvalidateOutput> {
    let invalidator = invalidator(config).await?;
    let notice = invalidator.purge_all().await;

    Ok(InvalidateOutput { recognised_tags: Vec::new(), dispatched: notice.is_some(), notice })
}

/// Implementation of the category-saved command.
pub async fn category_saved_impl(config: &AppConfig, args: CategorySavedArgs) -> anyhow::Result<CategorySavedOutput> {
    let catalog = load_catalog(config).await?;
    let category = catalog
        .category(args.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("category {} not found in catalog", args.id))?;

    let refresh_required = Invalidator::from_config(config, catalog).category_saved(&category);
    Ok(CategorySavedOutput { category_id: category.id, refresh_required })
}
