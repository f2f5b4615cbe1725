//! Incoming data mutations
use crate::audit::AuditAction;
use crate::field::FieldValue;
use crate::record::ActivityRecord;
use crate::types::{DatasetKind, OrganizationId, Year};

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Overwrite one field of an existing record or of the profile.
    SetField { field: String, value: FieldValue },
    Insert(ActivityRecord),
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub actor: String,
    pub organization_id: OrganizationId,
    pub year: Year,
    pub entity_kind: DatasetKind,
    /// Record id. Ignored for the organization profile.
    pub entity_id: String,
    pub mutation: Mutation,
}

impl ChangeEvent {
    pub fn set_field(
        actor: &str,
        organization_id: OrganizationId,
        year: Year,
        entity_kind: DatasetKind,
        entity_id: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Self {
        Self {
            actor: actor.to_string(),
            organization_id,
            year,
            entity_kind,
            entity_id: entity_id.to_string(),
            mutation: Mutation::SetField {
                field: field.to_string(),
                value: value.into(),
            },
        }
    }

    pub fn insert(actor: &str, organization_id: OrganizationId, year: Year, record: ActivityRecord) -> Self {
        Self {
            actor: actor.to_string(),
            organization_id,
            year,
            entity_kind: record.dataset_kind(),
            entity_id: record.id.clone(),
            mutation: Mutation::Insert(record),
        }
    }

    pub fn remove(
        actor: &str,
        organization_id: OrganizationId,
        year: Year,
        entity_kind: DatasetKind,
        entity_id: &str,
    ) -> Self {
        Self {
            actor: actor.to_string(),
            organization_id,
            year,
            entity_kind,
            entity_id: entity_id.to_string(),
            mutation: Mutation::Remove,
        }
    }

    pub fn audit_action(&self) -> AuditAction {
        match self.mutation {
            Mutation::SetField { .. } => AuditAction::Update,
            Mutation::Insert(_) => AuditAction::Create,
            Mutation::Remove => AuditAction::Delete,
        }
    }

    /// Field keys and values this change would write.
    pub fn proposed_fields(&self) -> Vec<(String, FieldValue)> {
        match &self.mutation {
            Mutation::SetField { field, value } => vec![(field.clone(), value.clone())],
            Mutation::Insert(record) => record
                .field_values()
                .into_iter()
                .map(|(field, value)| (field.key().to_string(), value))
                .collect(),
            Mutation::Remove => Vec::new(),
        }
    }
}
