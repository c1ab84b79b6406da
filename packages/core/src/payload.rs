//! Rendering a write plan into the wire payload of an entity edit.
//!
//! Only dirty parts are emitted. Parts of the entity the plan did not touch
//! are left out entirely, so a write never overwrites concurrent edits to
//! them. The JSON shape is:
//!
//! ```json
//! {
//!   "labels":       { "de": { "language": "de", "text": "Apfelstrudel" } },
//!   "descriptions": { "en": { "language": "en", "text": "pastry" } },
//!   "aliases":      { "en": [ { "language": "en", "text": "strudel" } ], "fr": [] },
//!   "claims":       [ { "mainsnak": { ... }, "rank": "normal" }, { "id": "Q7$a", "remove": "" } ]
//! }
//! ```
//!
//! Sections without dirty entries are omitted. A cleared alias language is
//! an empty array, never a missing key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::statement_diff::WritePlan;
use crate::term_diff::TermWritePlan;
use crate::types::{MonolingualText, Statement};

/// One entry of the `claims` array: a statement to write, or a removal marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ClaimEdit {
    /// `{ "id": "<statement id>", "remove": "" }`
    Remove { id: String, remove: String },
    /// The full statement representation.
    Write(Statement),
}

impl ClaimEdit {
    pub fn remove(id: impl Into<String>) -> Self {
        ClaimEdit::Remove {
            id: id.into(),
            remove: String::new(),
        }
    }
}

/// The `data` payload of an entity edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EditPayload {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, MonolingualText>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub descriptions: BTreeMap<String, MonolingualText>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, Vec<MonolingualText>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<ClaimEdit>,
}

impl EditPayload {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
            && self.descriptions.is_empty()
            && self.aliases.is_empty()
            && self.claims.is_empty()
    }

    /// Ids of statements this payload removes.
    pub fn removed_ids(&self) -> Vec<&str> {
        self.claims
            .iter()
            .filter_map(|c| match c {
                ClaimEdit::Remove { id, .. } => Some(id.as_str()),
                ClaimEdit::Write(_) => None,
            })
            .collect()
    }

    /// `true` when the payload does nothing but remove statements.
    pub fn is_removal_only(&self) -> bool {
        self.labels.is_empty()
            && self.descriptions.is_empty()
            && self.aliases.is_empty()
            && !self.claims.is_empty()
            && self
                .claims
                .iter()
                .all(|c| matches!(c, ClaimEdit::Remove { .. }))
    }
}

/// Build the payload for the dirty parts of `statements` and `terms`.
///
/// Returns `None` when the combined plan is an empty edit; the caller must
/// then skip the network call.
pub fn build_payload(statements: &WritePlan, terms: &TermWritePlan) -> Option<EditPayload> {
    if statements.is_empty_edit() && terms.is_empty_edit() {
        return None;
    }

    let payload = EditPayload {
        labels: terms
            .labels()
            .filter(|(_, u)| u.dirty)
            .map(|(lang, u)| (lang.to_string(), u.value.clone()))
            .collect(),
        descriptions: terms
            .descriptions()
            .filter(|(_, u)| u.dirty)
            .map(|(lang, u)| (lang.to_string(), u.value.clone()))
            .collect(),
        aliases: terms
            .all_aliases()
            .filter(|(_, u)| u.dirty)
            .map(|(lang, u)| (lang.to_string(), u.values.clone()))
            .collect(),
        claims: statements
            .dirty_statements()
            .cloned()
            .map(ClaimEdit::Write)
            .chain(statements.to_delete().iter().map(ClaimEdit::remove))
            .collect(),
    };
    Some(payload)
}

// --- tests -------------------------------------------------------------------
