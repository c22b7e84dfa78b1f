//! Verification-Type Catalog
//!
//! Read-through cache of verification types keyed by equipment-type id.
//! The cache is an explicit object handed to whoever needs the catalog;
//! entries are dropped with [`VerificationCatalog::invalidate`] when an
//! equipment type changes.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::collaborators::VerificationTypeSource;
use crate::error::CollaboratorError;
use crate::model::VerificationType;

pub struct VerificationCatalog<S> {
    source: S,
    entries: Arc<RwLock<HashMap<String, Arc<Vec<VerificationType>>>>>,
}

impl<S: VerificationTypeSource> VerificationCatalog<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Types for an equipment type, sorted by `order`; fetched once
    pub async fn get(&self, equipment_type_id: &str) -> Result<Arc<Vec<VerificationType>>, CollaboratorError> {
        {
            let entries = self.entries.read().await;
            if let Some(types) = entries.get(equipment_type_id) {
                return Ok(types.clone());
            }
        }

        debug!("Catalog miss for equipment type {}", equipment_type_id);
        let mut types = self.source.verification_types(equipment_type_id).await?;
        types.sort_by_key(|t| t.order);
        let types = Arc::new(types);

        let mut entries = self.entries.write().await;
        Ok(entries
            .entry(equipment_type_id.to_string())
            .or_insert(types)
            .clone())
    }

    pub async fn invalidate(&self, equipment_type_id: &str) {
        let mut entries = self.entries.write().await;
        if entries.remove(equipment_type_id).is_some() {
            debug!("Catalog entry for {} invalidated", equipment_type_id);
        }
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VerificationTypeSource for CountingSource {
        async fn verification_types(&self, equipment_type_id: &str) -> Result<Vec<VerificationType>, CollaboratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if equipment_type_id == "missing" {
                return Err(CollaboratorError::NotFound {
                    kind: "equipment type",
                    id: equipment_type_id.to_string(),
                });
            }
            Ok(vec![
                VerificationType { id: "m".into(), name: "Mensual".into(), frequency_days: 30, order: 2 },
                VerificationType { id: "d".into(), name: "Diaria".into(), frequency_days: 1, order: 1 },
            ])
        }
    }

    fn catalog() -> VerificationCatalog<CountingSource> {
        VerificationCatalog::new(CountingSource { calls: AtomicUsize::new(0) })
    }

    #[tokio::test]
    async fn test_read_through_and_sorted() {
        let catalog = catalog();
        let first = catalog.get("t1").await.unwrap();
        let second = catalog.get("t1").await.unwrap();

        assert_eq!(first[0].id, "d");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(catalog.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_refetches() {
        let catalog = catalog();
        catalog.get("t1").await.unwrap();
        catalog.invalidate("t1").await;
        assert!(catalog.entries.read().await.is_empty());

        catalog.get("t1").await.unwrap();
        assert_eq!(catalog.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let catalog = catalog();
        assert!(catalog.get("missing").await.is_err());
        assert!(catalog.get("missing").await.is_err());
        assert_eq!(catalog.source.calls.load(Ordering::SeqCst), 2);
        assert!(catalog.entries.read().await.is_empty());
    }
}
