//! Form-encoded action requests.

use serde::{Deserialize, Serialize};

/// The `action` parameter selecting the remote operation.
///
/// Serialises as the lowercase action name (e.g. `"wbeditentity"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Fetch one or more entities.
    WbGetEntities,
    /// Apply a partial entity document (terms and claims) in one revision.
    WbEditEntity,
    /// Remove statements by id in one revision.
    WbRemoveClaims,
}

/// Formats the action as its wire-format name.
impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::WbGetEntities => write!(f, "wbgetentities"),
            Action::WbEditEntity => write!(f, "wbeditentity"),
            Action::WbRemoveClaims => write!(f, "wbremoveclaims"),
        }
    }
}

/// Parameters of a `wbgetentities` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetEntitiesRequest {
    pub action: Action,
    /// `|`-separated entity ids.
    pub ids: String,
    pub format: String,
}

impl GetEntitiesRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            action: Action::WbGetEntities,
            ids: id.into(),
            format: "json".into(),
        }
    }
}

/// Parameters of a write call (`wbeditentity` or `wbremoveclaims`).
///
/// `data` is set for `wbeditentity` (the JSON payload as a string), `claim`
/// for `wbremoveclaims` (`|`-separated statement ids).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditRequest {
    pub action: Action,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim: Option<String>,

    /// Revision the edit was computed against; the store rejects the edit
    /// with `editconflict` if the entity has moved on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baserevid: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub bot: bool,

    /// Maximum replication lag in seconds the client tolerates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxlag: Option<u32>,

    /// CSRF token of the session.
    pub token: String,

    pub format: String,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl EditRequest {
    /// A write call with only the action and token set.
    pub fn new(action: Action, token: impl Into<String>) -> Self {
        Self {
            action,
            id: None,
            data: None,
            claim: None,
            baserevid: None,
            summary: None,
            bot: false,
            maxlag: None,
            token: token.into(),
            format: "json".into(),
        }
    }

    /// Statement ids listed in `claim`, in order.
    pub fn claim_ids(&self) -> Vec<&str> {
        self.claim
            .as_deref()
            .map(|c| c.split('|').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}
