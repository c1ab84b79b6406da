//! Successful action replies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use kbsync::EntityDocument;

/// Reply to `wbgetentities`.
///
/// ```json
/// { "entities": { "Q42": { "id": "Q42", "lastrevid": 7, "labels": { ... }, "claims": [ ... ] } } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetEntitiesResponse {
    pub entities: BTreeMap<String, EntityDocument>,
}

/// Reply to `wbeditentity`: the entity as stored after the edit.
///
/// The returned document is authoritative. It carries the ids assigned to
/// new statements and the new `lastrevid`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditEntityResponse {
    pub success: u8,
    pub entity: EntityDocument,
}

/// Revision information of the edited page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    pub lastrevid: u64,
}

/// Reply to `wbremoveclaims`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoveClaimsResponse {
    pub success: u8,
    pub pageinfo: PageInfo,
    /// Ids of the statements that were removed.
    #[serde(default)]
    pub claims: Vec<String>,
}
