use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An organization owning business entities and their documents.
/// Company management is a collaborator concern; docstore only reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
}

/// A concrete entity a document is attached to (a vehicle, an employee, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessEntity {
    pub id: Uuid,
    pub entity_type: String,
    pub company_id: Uuid,
}

/// A resolved actor identity. Identity management lives outside this core;
/// the store only answers "does this actor exist and is it privileged".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
    pub is_superuser: bool,
}
