//! Change tags carried by cache-clean notifications.
//!
//! Tags have the form `<prefix>_<kind>_<id>`, e.g. `catalog_product_100`,
//! `catalog_category_7` or `cms_page_3`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of catalog entity a tag refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Product,
    Category,
    Page,
}

impl TagKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TagKind::Product => "product",
            TagKind::Category => "category",
            TagKind::Page => "page",
        }
    }
}

/// Identifies which entity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeTag {
    pub kind: TagKind,
    pub id: u64,
}

impl ChangeTag {
    pub fn product(id: u64) -> Self {
        Self { kind: TagKind::Product, id }
    }

    pub fn category(id: u64) -> Self {
        Self { kind: TagKind::Category, id }
    }

    pub fn page(id: u64) -> Self {
        Self { kind: TagKind::Page, id }
    }

    /// Parse a raw tag, `None` for tags that do not name a purgeable entity.
    pub fn parse(raw: &str) -> Option<Self> {
        let fields: Vec<&str> = raw.split('_').collect();
        let [_, kind, id] = fields.as_slice() else {
            return None;
        };
        let kind = match *kind {
            "product" => TagKind::Product,
            "category" => TagKind::Category,
            "page" => TagKind::Page,
            _ => return None,
        };
        let id = id.parse().ok()?;
        Some(Self { kind, id })
    }

    /// Parse every recognised tag, dropping the rest.
    pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Vec<Self> {
        raw.iter()
            .filter_map(|tag| {
                let parsed = Self::parse(tag.as_ref());
                if parsed.is_none() {
                    tracing::trace!(tag = tag.as_ref(), "ignoring tag");
                }
                parsed
            })
            .collect()
    }
}

impl FromStr for ChangeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unrecognised change tag: {s}"))
    }
}

impl fmt::Display for ChangeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            TagKind::Page => "cms",
            TagKind::Product | TagKind::Category => "catalog",
        };
        write!(f, "{prefix}_{}_{}", self.kind.as_str(), self.id)
    }
}
