use crate::error::{Result, VectorStoreError};
use reco_protocol::Product;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const CATALOG_SCHEMA_VERSION: u32 = 1;

const BUILTIN_SEED: &str = include_str!("../../../catalog/seed.json");

/// Ordered, read-only product snapshot with unique `product_id`s.
///
/// Catalog order is the tie-break order everywhere downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCatalog {
    schema_version: u32,
    products: Vec<Product>,
}

impl Catalog {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_products(products: Vec<Product>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(product.product_id.as_str()) {
                let id = product.product_id.clone();
                return Err(VectorStoreError::DuplicateProduct(id));
            }
        }
        Ok(Self { products })
    }

    /// The reference catalog shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_SEED.as_bytes())
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let persisted: PersistedCatalog = serde_json::from_slice(bytes)?;
        if persisted.schema_version != CATALOG_SCHEMA_VERSION {
            return Err(VectorStoreError::CatalogError(format!(
                "Unsupported catalog schema_version {} (expected {CATALOG_SCHEMA_VERSION})",
                persisted.schema_version
            )));
        }
        Self::from_products(persisted.products)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let catalog = Self::from_json(&bytes)?;
        log::info!("Loaded {} products from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let persisted = PersistedCatalog {
            schema_version: CATALOG_SCHEMA_VERSION,
            products: self.products.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&persisted)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.product_id == product_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn product(id: &str) -> Product {
        Product {
            product_id: id.to_string(),
            name: format!("{id} name"),
            description: String::new(),
            category: "X".to_string(),
            constructs: vec!["personality".to_string()],
            use_cases: vec!["selection".to_string()],
            job_levels: vec!["entry".to_string()],
            job_families: vec!["it".to_string()],
            max_duration_min: 10,
            languages: vec!["en".to_string()],
            tags: Vec::new(),
        }
    }

    #[test]
    fn builtin_seed_keeps_reference_order() {
        let catalog = Catalog::builtin().unwrap();
        let ids: Vec<&str> = catalog
            .products()
            .iter()
            .map(|p| p.product_id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "VERIFY_G_PLUS",
                "SJT_CUSTOMER_SERVICE",
                "OPQ32R",
                "MQ_MOTIVATION",
            ]
        );
        assert_eq!(catalog.get("OPQ32R").map(|p| p.max_duration_min), Some(30));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let products = vec![product("A"), product("B"), product("A")];
        let err = Catalog::from_products(products).unwrap_err();
        assert!(matches!(err, VectorStoreError::DuplicateProduct(id) if id == "A"));
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let raw = br#"{"schema_version": 7, "products": []}"#;
        let err = Catalog::from_json(raw).unwrap_err();
        assert!(err.to_string().contains("schema_version 7"));
    }

    #[tokio::test]
    async fn catalog_roundtrip_through_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("catalog.json");

        let catalog = Catalog::from_products(vec![product("A"), product("B")]).unwrap();
        catalog.save(&path).await.unwrap();

        let loaded = Catalog::load(&path).await.unwrap();
        assert_eq!(loaded, catalog);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
