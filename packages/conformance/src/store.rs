//! In-memory entity store behind the mock action API.
//!
//! All entities are held in RAM behind a [`RwLock`]. Edits follow the
//! store's rules closely enough to exercise a client end to end: writes are
//! checked against the base revision and the session token, statements
//! without an id get a fresh `<entity>$<uuid>` id, and every accepted edit
//! bumps the revision by one.

use std::collections::BTreeMap;
use std::sync::RwLock;

use kbsync::{validate_document, ClaimEdit, EditPayload, EntityDocument, Statement};
use kbsync_api::{
    codes, Action, EditEntityResponse, EditRequest, ErrorResponse, GetEntitiesResponse, PageInfo,
    RemoveClaimsResponse,
};
use tracing::debug;

/// Token the store accepts unless configured otherwise.
pub const DEFAULT_TOKEN: &str = "+\\";

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

struct Inner {
    entities: BTreeMap<String, EntityDocument>,
    token: String,
    /// Number of upcoming calls to refuse with `maxlag`.
    lagging: u32,
    /// Every action received, in order, including refused ones.
    log: Vec<Action>,
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// Thread-safe in-memory store serving the action API.
pub struct MockStore {
    inner: RwLock<Inner>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::with_token(DEFAULT_TOKEN)
    }

    /// A store that only accepts writes carrying `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entities: BTreeMap::new(),
                token: token.into(),
                lagging: 0,
                log: Vec::new(),
            }),
        }
    }

    // --- Seeding and inspection -------------------------------------------

    /// Insert or replace an entity directly, bypassing the API.
    pub fn put_entity(&self, doc: EntityDocument) {
        let mut inner = self.write();
        inner.entities.insert(doc.id.clone(), doc);
    }

    pub fn entity(&self, id: &str) -> Option<EntityDocument> {
        self.read().entities.get(id).cloned()
    }

    /// Simulate another writer editing `id`: bump its revision without
    /// changing content.
    pub fn touch(&self, id: &str) {
        if let Some(doc) = self.write().entities.get_mut(id) {
            doc.revision_id += 1;
        }
    }

    /// Refuse the next `n` calls with a `maxlag` error.
    pub fn inject_maxlag(&self, n: u32) {
        self.write().lagging = n;
    }

    /// Actions received so far, in order.
    pub fn actions(&self) -> Vec<Action> {
        self.read().log.clone()
    }

    // --- Actions -------------------------------------------------------------

    /// Record `action` and apply the pre-checks shared by every call.
    pub(crate) fn admit(&self, action: Action, token: Option<&str>) -> Result<(), ErrorResponse> {
        let mut inner = self.write();
        inner.log.push(action);
        if inner.lagging > 0 {
            inner.lagging -= 1;
            return Err(ErrorResponse::new(
                codes::MAXLAG,
                "Waiting for a database server: 7 seconds lagged.",
            ));
        }
        if let Some(token) = token {
            if token != inner.token {
                return Err(ErrorResponse::new(codes::BAD_TOKEN, "Invalid CSRF token."));
            }
        }
        Ok(())
    }

    pub(crate) fn get_entities(&self, ids: &str) -> Result<GetEntitiesResponse, ErrorResponse> {
        let inner = self.read();
        let mut entities = BTreeMap::new();
        for id in ids.split('|').filter(|s| !s.is_empty()) {
            let doc = inner.entities.get(id).ok_or_else(|| {
                ErrorResponse::new(codes::NO_SUCH_ENTITY, format!("Could not find an entity with the ID \"{id}\"."))
            })?;
            entities.insert(id.to_string(), doc.clone());
        }
        Ok(GetEntitiesResponse { entities })
    }

    pub(crate) fn edit_entity(&self, req: &EditRequest) -> Result<EditEntityResponse, ErrorResponse> {
        let id = req
            .id
            .as_deref()
            .ok_or_else(|| ErrorResponse::new("no-id", "The id parameter must be set."))?;
        let data = req
            .data
            .as_deref()
            .ok_or_else(|| ErrorResponse::new("no-data", "The data parameter must be set."))?;
        let payload: EditPayload = serde_json::from_str(data)
            .map_err(|e| ErrorResponse::new("invalid-json", e.to_string()))?;

        let mut inner = self.write();
        let current = checked_base(&inner.entities, id, req.baserevid)?;

        let mut next = current.clone();
        apply_payload(&mut next, &payload)?;
        validate_document(&next)
            .map_err(|e| ErrorResponse::new(codes::MODIFICATION_FAILED, e.to_string()))?;
        next.revision_id += 1;

        debug!("store: {} now at revision {}", id, next.revision_id);
        inner.entities.insert(id.to_string(), next.clone());
        Ok(EditEntityResponse {
            success: 1,
            entity: next,
        })
    }

    pub(crate) fn remove_claims(&self, req: &EditRequest) -> Result<RemoveClaimsResponse, ErrorResponse> {
        let claims: Vec<String> = req.claim_ids().into_iter().map(String::from).collect();
        let first = claims
            .first()
            .ok_or_else(|| ErrorResponse::new("param-missing", "The claim parameter must be set."))?;
        let id = entity_of(first).to_string();

        let mut inner = self.write();
        let current = checked_base(&inner.entities, &id, req.baserevid)?;

        let mut next = current.clone();
        for claim in &claims {
            remove_statement(&mut next, claim)?;
        }
        next.revision_id += 1;

        let lastrevid = next.revision_id;
        inner.entities.insert(id, next);
        Ok(RemoveClaimsResponse {
            success: 1,
            pageinfo: PageInfo { lastrevid },
            claims,
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Edit application
// ---------------------------------------------------------------------------

/// Look up `id` and check the caller's base revision against it.
fn checked_base<'a>(
    entities: &'a BTreeMap<String, EntityDocument>,
    id: &str,
    baserevid: Option<u64>,
) -> Result<&'a EntityDocument, ErrorResponse> {
    let current = entities.get(id).ok_or_else(|| {
        ErrorResponse::new(codes::NO_SUCH_ENTITY, format!("Could not find an entity with the ID \"{id}\"."))
    })?;
    if let Some(base) = baserevid {
        if base != current.revision_id {
            return Err(ErrorResponse::new(
                codes::EDIT_CONFLICT,
                format!("Edit conflict: base revision {base}, current {}.", current.revision_id),
            ));
        }
    }
    Ok(current)
}

/// The entity id part of a statement id (`Q7$abc` -> `Q7`).
fn entity_of(statement_id: &str) -> &str {
    statement_id
        .split_once('$')
        .map(|(entity, _)| entity)
        .unwrap_or(statement_id)
}

fn apply_payload(doc: &mut EntityDocument, payload: &EditPayload) -> Result<(), ErrorResponse> {
    for (lang, label) in &payload.labels {
        if label.text.is_empty() {
            doc.labels.remove(lang);
        } else {
            doc.labels.insert(lang.clone(), label.clone());
        }
    }
    for (lang, description) in &payload.descriptions {
        if description.text.is_empty() {
            doc.descriptions.remove(lang);
        } else {
            doc.descriptions.insert(lang.clone(), description.clone());
        }
    }
    // Alias lists replace the stored list for their language.
    for (lang, aliases) in &payload.aliases {
        if aliases.is_empty() {
            doc.aliases.remove(lang);
        } else {
            doc.aliases.insert(lang.clone(), aliases.clone());
        }
    }

    for claim in &payload.claims {
        match claim {
            ClaimEdit::Remove { id, .. } => remove_statement(doc, id)?,
            ClaimEdit::Write(statement) => write_statement(doc, statement.clone())?,
        }
    }
    Ok(())
}

fn remove_statement(doc: &mut EntityDocument, id: &str) -> Result<(), ErrorResponse> {
    let before = doc.statements.len();
    doc.statements.retain(|s| s.id.as_deref() != Some(id));
    if doc.statements.len() == before {
        return Err(ErrorResponse::new(
            "no-such-claim",
            format!("Could not find a statement with the GUID \"{id}\"."),
        ));
    }
    Ok(())
}

/// Replace the statement with the same id, or insert a new one after the
/// last statement of its property.
fn write_statement(doc: &mut EntityDocument, mut statement: Statement) -> Result<(), ErrorResponse> {
    match statement.id.clone() {
        Some(id) => {
            if entity_of(&id) != doc.id {
                return Err(ErrorResponse::new(
                    "invalid-guid",
                    format!("Statement GUID \"{id}\" does not belong to {}.", doc.id),
                ));
            }
            if let Some(slot) = doc
                .statements
                .iter_mut()
                .find(|s| s.id.as_deref() == Some(id.as_str()))
            {
                *slot = statement;
                return Ok(());
            }
        }
        None => {
            statement.id = Some(format!("{}${}", doc.id, uuid::Uuid::now_v7()));
        }
    }

    let at = doc
        .statements
        .iter()
        .rposition(|s| s.property() == statement.property())
        .map(|i| i + 1)
        .unwrap_or(doc.statements.len());
    doc.statements.insert(at, statement);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbsync::{MonolingualText, Snak, Value};

    fn stmt(value: &str) -> Statement {
        Statement::new(Snak::value("P31", Value::entity(value)))
    }

    fn seeded() -> MockStore {
        let store = MockStore::new();
        let mut doc = EntityDocument::new("Q7");
        doc.revision_id = 3;
        doc.statements = vec![stmt("Q1").with_id("Q7$a")];
        store.put_entity(doc);
        store
    }

    fn edit(payload: &EditPayload, baserevid: Option<u64>) -> EditRequest {
        let mut req = EditRequest::new(Action::WbEditEntity, DEFAULT_TOKEN);
        req.id = Some("Q7".into());
        req.data = Some(serde_json::to_string(payload).unwrap());
        req.baserevid = baserevid;
        req
    }

    #[test]
    fn new_statement_gets_id_and_revision_bumps() {
        let store = seeded();
        let payload = EditPayload {
            claims: vec![ClaimEdit::Write(stmt("Q2"))],
            ..EditPayload::default()
        };

        let reply = store.edit_entity(&edit(&payload, Some(3))).unwrap();

        assert_eq!(reply.entity.revision_id, 4);
        assert_eq!(reply.entity.statements.len(), 2);
        let id = reply.entity.statements[1].id.as_deref().unwrap();
        assert!(id.starts_with("Q7$"));
        assert_eq!(store.entity("Q7").unwrap(), reply.entity);
    }

    #[test]
    fn stale_base_revision_conflicts() {
        let store = seeded();
        let payload = EditPayload {
            labels: [("en".to_string(), MonolingualText::new("x", "en"))].into(),
            ..EditPayload::default()
        };
        let err = store.edit_entity(&edit(&payload, Some(2))).unwrap_err();
        assert_eq!(err.error.code, codes::EDIT_CONFLICT);
        assert_eq!(store.entity("Q7").unwrap().revision_id, 3);
    }

    #[test]
    fn removing_unknown_statement_fails() {
        let store = seeded();
        let mut req = EditRequest::new(Action::WbRemoveClaims, DEFAULT_TOKEN);
        req.claim = Some("Q7$zzz".into());
        let err = store.remove_claims(&req).unwrap_err();
        assert_eq!(err.error.code, "no-such-claim");
    }

    #[test]
    fn maxlag_then_token_checks() {
        let store = MockStore::with_token("secret");
        store.inject_maxlag(1);
        let first = store.admit(Action::WbEditEntity, Some("secret")).unwrap_err();
        assert_eq!(first.error.code, codes::MAXLAG);
        let second = store.admit(Action::WbEditEntity, Some("wrong")).unwrap_err();
        assert_eq!(second.error.code, codes::BAD_TOKEN);
        assert!(store.admit(Action::WbGetEntities, None).is_ok());
        assert_eq!(store.actions().len(), 3);
    }

    #[test]
    fn foreign_statement_id_is_rejected() {
        let store = seeded();
        let payload = EditPayload {
            claims: vec![ClaimEdit::Write(stmt("Q2").with_id("Q8$x"))],
            ..EditPayload::default()
        };
        let err = store.edit_entity(&edit(&payload, None)).unwrap_err();
        assert_eq!(err.error.code, "invalid-guid");
    }
}
