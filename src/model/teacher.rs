use serde::Serialize;
use utoipa::ToSchema;

/// Teacher lookup collaborator. CRUD lives outside this service; the engine
/// only maps device badge ids and auth identities to teachers.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: u64,
    pub name: String,
    /// Employee registration number.
    pub nip: String,
    /// Badge id assigned by the fingerprint device, if enrolled.
    pub fingerprint_id: Option<String>,
}
