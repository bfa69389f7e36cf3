use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Business, CatalogItem, Category};

/// Longest category chain followed when resolving an inherited tax rate.
const MAX_CATEGORY_DEPTH: usize = 16;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn item(&self, item_id: Uuid) -> anyhow::Result<Option<CatalogItem>>;

    async fn category(&self, category_id: Uuid) -> anyhow::Result<Option<Category>>;

    async fn business(&self, business_id: Uuid) -> anyhow::Result<Option<Business>>;

    async fn partner_exists(&self, partner_id: Uuid) -> anyhow::Result<bool>;

    /// Effective tax percentage for a category. Inheriting categories take
    /// their parent's resolved rate; a root that claims to inherit, or a
    /// chain that loops, falls back to the last category's own rate.
    /// `None` when the category does not exist.
    async fn tax_rate(&self, category_id: Uuid) -> anyhow::Result<Option<Decimal>> {
        let Some(mut category) = self.category(category_id).await? else {
            return Ok(None);
        };

        for _ in 0..MAX_CATEGORY_DEPTH {
            let parent = match (category.inherits_tax, category.parent_id) {
                (true, Some(parent_id)) => self.category(parent_id).await?,
                _ => None,
            };
            match parent {
                Some(parent) => category = parent,
                None => return Ok(Some(category.tax_rate)),
            }
        }

        tracing::warn!(category_id = %category_id, "Category chain too deep, using last rate");
        Ok(Some(category.tax_rate))
    }
}

// ============================================================================
// In-Memory Catalog
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub partners: Vec<Uuid>,
    #[serde(default)]
    pub businesses: Vec<Business>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

#[derive(Default)]
struct CatalogData {
    partners: HashSet<Uuid>,
    businesses: HashMap<Uuid, Business>,
    categories: HashMap<Uuid, Category>,
    items: HashMap<Uuid, CatalogItem>,
}

#[derive(Default)]
pub struct InMemoryCatalog {
    data: RwLock<CatalogData>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: CatalogSeed) -> Self {
        let data = CatalogData {
            partners: seed.partners.into_iter().collect(),
            businesses: seed.businesses.into_iter().map(|b| (b.id, b)).collect(),
            categories: seed.categories.into_iter().map(|c| (c.id, c)).collect(),
            items: seed.items.into_iter().map(|i| (i.id, i)).collect(),
        };
        Self {
            data: RwLock::new(data),
        }
    }

    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let seed: CatalogSeed = serde_json::from_str(&raw)?;

        tracing::info!(
            path = %path.display(),
            businesses = seed.businesses.len(),
            categories = seed.categories.len(),
            items = seed.items.len(),
            "Loaded catalog seed"
        );
        Ok(Self::from_seed(seed))
    }

    pub async fn add_partner(&self, partner_id: Uuid) {
        self.data.write().await.partners.insert(partner_id);
    }

    pub async fn put_business(&self, business: Business) {
        let mut data = self.data.write().await;
        data.partners.insert(business.partner_id);
        data.businesses.insert(business.id, business);
    }

    pub async fn put_category(&self, category: Category) {
        self.data.write().await.categories.insert(category.id, category);
    }

    pub async fn put_item(&self, item: CatalogItem) {
        self.data.write().await.items.insert(item.id, item);
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn item(&self, item_id: Uuid) -> anyhow::Result<Option<CatalogItem>> {
        Ok(self.data.read().await.items.get(&item_id).cloned())
    }

    async fn category(&self, category_id: Uuid) -> anyhow::Result<Option<Category>> {
        Ok(self.data.read().await.categories.get(&category_id).cloned())
    }

    async fn business(&self, business_id: Uuid) -> anyhow::Result<Option<Business>> {
        Ok(self.data.read().await.businesses.get(&business_id).cloned())
    }

    async fn partner_exists(&self, partner_id: Uuid) -> anyhow::Result<bool> {
        Ok(self.data.read().await.partners.contains(&partner_id))
    }
}
