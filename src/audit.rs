//! Append-only audit trail
//!
//! Entries are written before validation runs, so the trail records what was
//! attempted, not only what succeeded. Nothing in this module updates or
//! deletes an entry once written.
use crate::error::StoreError;
use crate::field::FieldValue;
use crate::types::{DatasetKind, OrganizationId, TimeStamp};
use crate::utils;
use async_trait::async_trait;
use chrono::Utc;
use sled::Tree;
use uuid7::uuid7;

pub const AUDIT_TREE: &str = "audit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum AuditAction {
    #[n(0)]
    Create,
    #[n(1)]
    Update,
    #[n(2)]
    Delete,
    #[n(3)]
    Recalculate,
    #[n(4)]
    Export,
}

#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct AuditEntry {
    #[n(0)]
    pub actor: String,
    #[n(1)]
    pub organization_id: OrganizationId,
    #[n(2)]
    pub action: AuditAction,
    #[n(3)]
    pub entity_kind: Option<DatasetKind>,
    #[n(4)]
    pub entity_id: Option<String>,
    #[n(5)]
    pub field: Option<String>,
    #[n(6)]
    pub old_value: Option<FieldValue>,
    #[n(7)]
    pub new_value: Option<FieldValue>,
    #[n(8)]
    pub timestamp: TimeStamp<Utc>,
    /// Free-form context, e.g. the export format.
    #[n(9)]
    pub detail: Option<String>,
}

impl AuditEntry {
    pub fn new(actor: &str, organization_id: OrganizationId, action: AuditAction) -> Self {
        Self {
            actor: actor.to_string(),
            organization_id,
            action,
            entity_kind: None,
            entity_id: None,
            field: None,
            old_value: None,
            new_value: None,
            timestamp: TimeStamp::new(),
            detail: None,
        }
    }
    pub fn set_entity(mut self, kind: DatasetKind, id: &str) -> Self {
        self.entity_kind = Some(kind);
        self.entity_id = Some(id.to_string());
        self
    }
    pub fn set_change(mut self, field: &str, old: Option<FieldValue>, new: Option<FieldValue>) -> Self {
        self.field = Some(field.to_string());
        self.old_value = old;
        self.new_value = new;
        self
    }
    pub fn set_detail(mut self, detail: &str) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    /// CBOR encoding and its sha256 digest.
    pub fn build(&self) -> Result<(String, Vec<u8>), StoreError> {
        let cbor = minicbor::to_vec(self).map_err(|e| StoreError::Encode {
            what: "audit entry",
            message: e.to_string(),
        })?;
        let hash = sha256::digest(&cbor);

        Ok((hash, cbor))
    }
}

/// Returned by [`AuditLog::record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReceipt {
    pub id: String,
    pub digest: String,
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<AuditReceipt, StoreError>;

    /// Chronological.
    async fn by_organization(&self, organization_id: &OrganizationId) -> Result<Vec<AuditEntry>, StoreError>;

    /// Chronological.
    async fn by_action(&self, action: AuditAction) -> Result<Vec<AuditEntry>, StoreError>;

    /// Chronological, both bounds inclusive.
    async fn in_range(&self, from: &TimeStamp<Utc>, to: &TimeStamp<Utc>) -> Result<Vec<AuditEntry>, StoreError>;

    /// The `limit` newest entries, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, StoreError>;
}

/// Audit log kept in its own sled tree, keyed by uuid7 so key order is time order.
pub struct SledAuditLog {
    tree: Tree,
}

impl SledAuditLog {
    pub fn open(db: &sled::Db) -> Result<Self, StoreError> {
        Ok(Self {
            tree: db.open_tree(AUDIT_TREE)?,
        })
    }

    fn decode(value: &[u8]) -> Result<AuditEntry, StoreError> {
        Ok(minicbor::decode(value)?)
    }

    fn scan(&self, keep: impl Fn(&AuditEntry) -> bool) -> Result<Vec<AuditEntry>, StoreError> {
        let mut entries = Vec::new();
        for item in self.tree.iter() {
            let (_, value) = item?;
            let entry = Self::decode(&value)?;
            if keep(&entry) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl AuditLog for SledAuditLog {
    async fn record(&self, entry: AuditEntry) -> Result<AuditReceipt, StoreError> {
        let (digest, cbor) = entry.build()?;
        let key = uuid7();
        let id = utils::bytes_to_bech32("audit_", key.as_bytes()).map_err(|e| StoreError::Encode {
            what: "audit id",
            message: e.to_string(),
        })?;

        self.tree.insert(key.as_bytes(), cbor)?;
        tracing::debug!(
            audit_id = %id,
            org = %entry.organization_id,
            action = ?entry.action,
            "audit entry recorded"
        );

        Ok(AuditReceipt { id, digest })
    }

    async fn by_organization(&self, organization_id: &OrganizationId) -> Result<Vec<AuditEntry>, StoreError> {
        self.scan(|entry| &entry.organization_id == organization_id)
    }

    async fn by_action(&self, action: AuditAction) -> Result<Vec<AuditEntry>, StoreError> {
        self.scan(|entry| entry.action == action)
    }

    async fn in_range(&self, from: &TimeStamp<Utc>, to: &TimeStamp<Utc>) -> Result<Vec<AuditEntry>, StoreError> {
        let (from, to) = (from.to_datetime_utc(), to.to_datetime_utc());
        self.scan(|entry| {
            let at = entry.timestamp.to_datetime_utc();
            at >= from && at <= to
        })
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, StoreError> {
        let mut entries = Vec::with_capacity(limit);
        for item in self.tree.iter().rev().take(limit) {
            let (_, value) = item?;
            entries.push(Self::decode(&value)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn update(org: &str, field: &str) -> AuditEntry {
        AuditEntry::new("user_1", org.into(), AuditAction::Update)
            .set_entity(DatasetKind::FixedInstallations, "rec_1")
            .set_change(field, Some(FieldValue::Number(1.0)), Some(FieldValue::Number(2.0)))
    }

    #[tokio::test]
    async fn recent_is_newest_first() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let db = sled::open(dir.path().join("audit.db"))?;
        let log = SledAuditLog::open(&db)?;

        log.record(update("org-1", "a")).await?;
        log.record(update("org-1", "b")).await?;
        log.record(update("org-1", "c")).await?;

        let recent = log.recent(2).await?;
        let fields: Vec<_> = recent.iter().filter_map(|e| e.field.as_deref()).collect();
        assert_eq!(fields, vec!["c", "b"]);
        Ok(())
    }

    #[tokio::test]
    async fn filters_by_organization_and_action() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let db = sled::open(dir.path().join("audit.db"))?;
        let log = SledAuditLog::open(&db)?;

        log.record(update("org-1", "cantidad")).await?;
        log.record(update("org-2", "cantidad")).await?;
        log.record(AuditEntry::new("user_1", "org-1".into(), AuditAction::Export).set_detail("xlsx"))
            .await?;

        assert_eq!(log.by_organization(&"org-1".into()).await?.len(), 2);
        let exports = log.by_action(AuditAction::Export).await?;
        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].detail.as_deref(), Some("xlsx"));
        Ok(())
    }

    #[tokio::test]
    async fn receipt_digest_matches_entry() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let db = sled::open(dir.path().join("audit.db"))?;
        let log = SledAuditLog::open(&db)?;

        let entry = update("org-1", "cantidad");
        let (expected, _) = entry.build()?;
        let receipt = log.record(entry).await?;

        assert_eq!(receipt.digest, expected);
        assert!(receipt.id.starts_with("audit_1"));
        Ok(())
    }

    #[tokio::test]
    async fn range_bounds_are_inclusive() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let db = sled::open(dir.path().join("audit.db"))?;
        let log = SledAuditLog::open(&db)?;

        let entry = update("org-1", "cantidad");
        let at = entry.timestamp.clone();
        log.record(entry).await?;

        let mut old = update("org-1", "recarga_kg");
        old.timestamp = TimeStamp::new_with(2020, 1, 1, 0, 0, 0).unwrap();
        log.record(old).await?;

        let within = log.in_range(&at, &at).await?;
        assert_eq!(within.len(), 1);
        assert_eq!(within[0].field.as_deref(), Some("cantidad"));

        let from = TimeStamp::new_with(2019, 12, 31, 0, 0, 0).unwrap();
        let to = TimeStamp::new_with(2020, 1, 2, 0, 0, 0).unwrap();
        let early = log.in_range(&from, &to).await?;
        assert_eq!(early.len(), 1);
        assert_eq!(early[0].field.as_deref(), Some("recarga_kg"));
        Ok(())
    }
}
