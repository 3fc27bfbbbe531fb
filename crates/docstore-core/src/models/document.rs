use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Document-level validation workflow status.
///
/// Stored as a one-character code (`P`/`A`/`R`). `Approved` and `Rejected`
/// are terminal: once set, the workflow never moves the document again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ValidationStatus {
    pub fn as_code(&self) -> &'static str {
        match self {
            ValidationStatus::Pending => "P",
            ValidationStatus::Approved => "A",
            ValidationStatus::Rejected => "R",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "P" => Some(ValidationStatus::Pending),
            "A" => Some(ValidationStatus::Approved),
            "R" => Some(ValidationStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ValidationStatus::Approved | ValidationStatus::Rejected)
    }
}

/// A stored document artifact tied to a company and a business entity.
///
/// `storage_key` is the logical, slash-separated key under the storage root
/// (e.g. `companies/<id>/vehicles/<id>/soat.pdf`); `size_bytes` and `sha256`
/// are reconciled after the upload completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub company_id: Uuid,
    pub entity_id: Uuid,
    pub name: String,
    pub content_type: String,
    pub size_bytes: Option<i64>,
    pub storage_key: String,
    pub sha256: Option<String>,
    pub validation_enabled: bool,
    pub validation_status: Option<ValidationStatus>,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Input for document creation. The workflow invariant is enforced by
/// `NewDocument::into_document`: `validation_status` is `Pending` exactly
/// when `validation_enabled` is true, absent otherwise.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub company_id: Uuid,
    pub entity_id: Uuid,
    pub name: String,
    pub content_type: String,
    pub size_bytes: Option<i64>,
    pub storage_key: String,
    pub validation_enabled: bool,
    pub creator_id: Option<Uuid>,
}

impl NewDocument {
    pub fn into_document(self, now: DateTime<Utc>) -> Document {
        let validation_status = self.validation_enabled.then_some(ValidationStatus::Pending);
        Document {
            id: Uuid::new_v4(),
            company_id: self.company_id,
            entity_id: self.entity_id,
            name: self.name,
            content_type: self.content_type,
            size_bytes: self.size_bytes,
            storage_key: self.storage_key,
            sha256: None,
            validation_enabled: self.validation_enabled,
            validation_status,
            creator_id: self.creator_id,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_doc(validation_enabled: bool) -> NewDocument {
        NewDocument {
            company_id: Uuid::new_v4(),
            entity_id: Uuid::new_v4(),
            name: "soat.pdf".into(),
            content_type: "application/pdf".into(),
            size_bytes: None,
            storage_key: "companies/c/vehicles/v/soat.pdf".into(),
            validation_enabled,
            creator_id: None,
        }
    }

    #[test]
    fn validation_status_tracks_enabled_flag() {
        let doc = new_doc(true).into_document(Utc::now());
        assert_eq!(doc.validation_status, Some(ValidationStatus::Pending));

        let doc = new_doc(false).into_document(Utc::now());
        assert_eq!(doc.validation_status, None);
    }

    #[test]
    fn status_codes_round_trip() {
        for status in [
            ValidationStatus::Pending,
            ValidationStatus::Approved,
            ValidationStatus::Rejected,
        ] {
            assert_eq!(ValidationStatus::from_code(status.as_code()), Some(status));
        }
        assert_eq!(ValidationStatus::from_code("X"), None);
    }
}
