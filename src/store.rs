//! Key-value persistence of datasets per (organization, year, kind)
use crate::error::StoreError;
use crate::profile::OrganizationProfile;
use crate::record::ActivityRecord;
use crate::results::OrganizationYearResults;
use crate::types::{DatasetKey, DatasetKind, OrganizationId, Year};
use async_trait::async_trait;
use sled::Db;
use std::sync::Arc;

pub const DATASET_TREE: &str = "datasets";

#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn load(&self, key: &DatasetKey) -> Result<Option<Vec<u8>>, StoreError>;
    async fn save(&self, key: &DatasetKey, data: Vec<u8>) -> Result<(), StoreError>;
}

/// Aggregate size of the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsageStats {
    pub size_bytes: u64,
    pub row_count: u64,
}

#[async_trait]
pub trait UsageStatsProvider: Send + Sync {
    /// Expensive: expected to scan or aggregate the whole store.
    async fn usage_stats(&self) -> Result<UsageStats, StoreError>;
}

fn encode<T: minicbor::Encode<()> + ?Sized>(what: &'static str, value: &T) -> Result<Vec<u8>, StoreError> {
    minicbor::to_vec(value).map_err(|e| StoreError::Encode {
        what,
        message: e.to_string(),
    })
}

fn decode<T: for<'b> minicbor::Decode<'b, ()>>(key: &DatasetKey, bytes: &[u8]) -> Result<T, StoreError> {
    minicbor::decode(bytes).map_err(|e| StoreError::Corrupt {
        key: key.to_storage_key(),
        reason: e.to_string(),
    })
}

/// Typed access on top of any [`DatasetStore`].
#[derive(Clone)]
pub struct Datasets {
    store: Arc<dyn DatasetStore>,
}

impl Datasets {
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self { store }
    }

    pub async fn load_records(
        &self,
        organization_id: &OrganizationId,
        year: Year,
        kind: DatasetKind,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        let key = DatasetKey::new(organization_id.clone(), year, kind);
        match self.store.load(&key).await? {
            Some(bytes) => decode(&key, &bytes),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save_records(
        &self,
        organization_id: &OrganizationId,
        year: Year,
        kind: DatasetKind,
        records: &[ActivityRecord],
    ) -> Result<(), StoreError> {
        let key = DatasetKey::new(organization_id.clone(), year, kind);
        self.store.save(&key, encode("activity records", records)?).await
    }

    pub async fn load_profile(
        &self,
        organization_id: &OrganizationId,
        year: Year,
    ) -> Result<Option<OrganizationProfile>, StoreError> {
        let key = DatasetKey::new(organization_id.clone(), year, DatasetKind::OrganizationProfile);
        self.store
            .load(&key)
            .await?
            .map(|bytes| decode(&key, &bytes))
            .transpose()
    }

    pub async fn save_profile(
        &self,
        organization_id: &OrganizationId,
        year: Year,
        profile: &OrganizationProfile,
    ) -> Result<(), StoreError> {
        let key = DatasetKey::new(organization_id.clone(), year, DatasetKind::OrganizationProfile);
        self.store.save(&key, encode("organization profile", profile)?).await
    }

    pub async fn load_results(
        &self,
        organization_id: &OrganizationId,
        year: Year,
    ) -> Result<Option<OrganizationYearResults>, StoreError> {
        let key = DatasetKey::new(organization_id.clone(), year, DatasetKind::Results);
        self.store
            .load(&key)
            .await?
            .map(|bytes| decode(&key, &bytes))
            .transpose()
    }

    pub async fn save_results(&self, results: &OrganizationYearResults) -> Result<(), StoreError> {
        let key = DatasetKey::new(results.organization_id.clone(), results.year, DatasetKind::Results);
        self.store.save(&key, encode("results", results)?).await
    }
}

/// Sled-backed store. Also reports its own usage for the quota guard.
pub struct SledStore {
    instance: Arc<Db>,
    tree: sled::Tree,
}

impl SledStore {
    pub fn new(instance: Arc<Db>) -> Result<Self, StoreError> {
        let tree = instance.open_tree(DATASET_TREE)?;
        Ok(Self { instance, tree })
    }
}

#[async_trait]
impl DatasetStore for SledStore {
    async fn load(&self, key: &DatasetKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .tree
            .get(key.to_storage_key().as_bytes())?
            .map(|value| value.to_vec()))
    }

    async fn save(&self, key: &DatasetKey, data: Vec<u8>) -> Result<(), StoreError> {
        self.tree.insert(key.to_storage_key().as_bytes(), data)?;
        Ok(())
    }
}

#[async_trait]
impl UsageStatsProvider for SledStore {
    async fn usage_stats(&self) -> Result<UsageStats, StoreError> {
        let mut row_count = 0u64;
        for name in self.instance.tree_names() {
            row_count += self.instance.open_tree(name)?.len() as u64;
        }
        Ok(UsageStats {
            size_bytes: self.instance.size_on_disk()?,
            row_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Activity;
    use tempfile::tempdir;

    fn open() -> anyhow::Result<(tempfile::TempDir, SledStore)> {
        let dir = tempdir()?;
        let db = Arc::new(sled::open(dir.path().join("store.db"))?);
        Ok((dir, SledStore::new(db)?))
    }

    #[tokio::test]
    async fn missing_dataset_loads_as_none() -> anyhow::Result<()> {
        let (_dir, store) = open()?;
        let key = DatasetKey::new("org-1".into(), 2024, DatasetKind::Fugitive);
        assert!(store.load(&key).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn records_survive_a_save() -> anyhow::Result<()> {
        let (_dir, store) = open()?;
        let datasets = Datasets::new(Arc::new(store));
        let org: OrganizationId = "org-1".into();
        let records = vec![ActivityRecord::new(
            "rec_1",
            "Almacén",
            Activity::Fugitive {
                gas: "R-32".into(),
                gwp: None,
                recharge_kg: 3.0,
            },
        )];

        datasets
            .save_records(&org, 2024, DatasetKind::Fugitive, &records)
            .await?;
        let loaded = datasets.load_records(&org, 2024, DatasetKind::Fugitive).await?;
        assert_eq!(loaded, records);
        // other years are independent
        assert!(datasets.load_records(&org, 2023, DatasetKind::Fugitive).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn usage_counts_rows() -> anyhow::Result<()> {
        let (_dir, store) = open()?;
        let before = store.usage_stats().await?;
        store
            .save(&DatasetKey::new("org-1".into(), 2024, DatasetKind::Process), vec![1, 2, 3])
            .await?;
        let after = store.usage_stats().await?;
        assert_eq!(after.row_count, before.row_count + 1);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_values_are_reported() -> anyhow::Result<()> {
        let (_dir, store) = open()?;
        let key = DatasetKey::new("org-1".into(), 2024, DatasetKind::Results);
        store.save(&key, vec![0xff, 0x00]).await?;

        let datasets = Datasets::new(Arc::new(store));
        let err = datasets.load_results(&"org-1".into(), 2024).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        Ok(())
    }
}
