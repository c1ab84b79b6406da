//! The edit submitter: reconcile, then write only what changed.
//!
//! [`EditSubmitter`] owns a pooled [`reqwest::Client`] and an atomic edit
//! counter, so a single instance can be shared behind an `Arc` across tasks.
//!
//! Every call goes through the same retry loop: a `maxlag` or `ratelimited`
//! error body, or an HTTP 429 or 503 status, is retried after a delay. The
//! delay is the reply's `Retry-After` header when present (seconds or an
//! HTTP date), otherwise `retry_base * 2^attempt`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime};

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use kbsync::{EditPayload, EditPlan, EntityDelta, EntityDocument};
use kbsync_api::{
    Action, EditEntityResponse, EditRequest, ErrorBody, GetEntitiesRequest, GetEntitiesResponse,
    RemoveClaimsResponse,
};

use crate::config::ClientConfig;
use crate::error::SubmitError;

/// Upper bound on a single computed backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Per-edit options.
#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    /// Edit summary shown in the entity's history.
    pub summary: Option<String>,

    /// Flag this edit as a bot edit even if the configuration does not.
    pub bot: bool,
}

impl EditOptions {
    pub fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            bot: false,
        }
    }
}

/// What [`EditSubmitter::submit`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The change was already in place; nothing was sent. Carries the
    /// unmodified snapshot.
    NoOp(EntityDocument),

    /// Simulate mode: the payload that would have been sent, and the entity
    /// as it would look afterwards (new statements without ids).
    Simulated {
        payload: EditPayload,
        entity: EntityDocument,
    },

    /// The store accepted the edit. Carries the entity at its new revision.
    Submitted(EntityDocument),
}

impl EditOutcome {
    /// The entity after this outcome.
    pub fn entity(&self) -> &EntityDocument {
        match self {
            EditOutcome::NoOp(entity)
            | EditOutcome::Simulated { entity, .. }
            | EditOutcome::Submitted(entity) => entity,
        }
    }

    pub fn into_entity(self) -> EntityDocument {
        match self {
            EditOutcome::NoOp(entity)
            | EditOutcome::Simulated { entity, .. }
            | EditOutcome::Submitted(entity) => entity,
        }
    }

    /// `true` unless nothing needed to change.
    pub fn changed(&self) -> bool {
        !matches!(self, EditOutcome::NoOp(_))
    }
}

/// Sends reconciled edits to the store.
pub struct EditSubmitter {
    client: Client,
    config: ClientConfig,
    edits: AtomicU32,
}

impl EditSubmitter {
    /// Build a submitter with its own HTTP client using the configured timeout.
    pub fn new(config: ClientConfig) -> Result<Self, SubmitError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("kbsync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Build a submitter around a pre-configured `reqwest::Client`.
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self {
            client,
            config,
            edits: AtomicU32::new(0),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Number of edits counted against the budget so far.
    pub fn edits_made(&self) -> u32 {
        self.edits.load(Ordering::SeqCst)
    }

    /// Fetch the current snapshot of entity `id`.
    pub async fn fetch_entity(&self, id: &str) -> Result<EntityDocument, SubmitError> {
        let mut reply: GetEntitiesResponse = self.call(&GetEntitiesRequest::new(id)).await?;
        reply
            .entities
            .remove(id)
            .ok_or_else(|| SubmitError::MalformedResponse(format!("entity {id} missing from reply")))
    }

    /// Reconcile `delta` against `snapshot` and write the result.
    ///
    /// An empty plan returns [`EditOutcome::NoOp`] without touching the
    /// network or the edit budget. A payload that only removes statements
    /// is sent as `wbremoveclaims`, anything else as one `wbeditentity`.
    /// The snapshot's revision is sent as the base revision, so a stale
    /// snapshot fails with [`SubmitError::EditConflict`].
    pub async fn submit(
        &self,
        snapshot: &EntityDocument,
        delta: &EntityDelta,
        options: &EditOptions,
    ) -> Result<EditOutcome, SubmitError> {
        let plan = EditPlan::reconcile(snapshot, delta);
        let Some(payload) = plan.payload() else {
            debug!("submit: {} already up to date", snapshot.id);
            return Ok(EditOutcome::NoOp(snapshot.clone()));
        };

        self.reserve_edit()?;

        if self.config.simulate {
            info!(
                "submit: simulated edit of {}: {}",
                snapshot.id,
                serde_json::to_string(&payload)?
            );
            return Ok(EditOutcome::Simulated {
                entity: plan.projected(snapshot),
                payload,
            });
        }

        let result = if payload.is_removal_only() {
            self.remove_claims(snapshot, &plan, &payload, options).await
        } else {
            self.edit_entity(snapshot, &payload, options).await
        };

        match result {
            Ok(entity) => {
                info!(
                    "submit: edited {} (revision {} -> {})",
                    snapshot.id, snapshot.revision_id, entity.revision_id
                );
                Ok(EditOutcome::Submitted(entity))
            }
            Err(e) => {
                self.edits.fetch_sub(1, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    async fn edit_entity(
        &self,
        snapshot: &EntityDocument,
        payload: &EditPayload,
        options: &EditOptions,
    ) -> Result<EntityDocument, SubmitError> {
        let mut request = self.write_request(Action::WbEditEntity, snapshot, options);
        request.id = Some(snapshot.id.clone());
        request.data = Some(serde_json::to_string(payload)?);
        debug!("submit: wbeditentity {} data={:?}", snapshot.id, request.data);

        let reply: EditEntityResponse = self.call(&request).await?;
        if reply.success != 1 {
            return Err(SubmitError::MalformedResponse("success flag not set".into()));
        }
        Ok(reply.entity)
    }

    async fn remove_claims(
        &self,
        snapshot: &EntityDocument,
        plan: &EditPlan,
        payload: &EditPayload,
        options: &EditOptions,
    ) -> Result<EntityDocument, SubmitError> {
        let mut request = self.write_request(Action::WbRemoveClaims, snapshot, options);
        request.claim = Some(payload.removed_ids().join("|"));
        debug!("submit: wbremoveclaims {} claim={:?}", snapshot.id, request.claim);

        let reply: RemoveClaimsResponse = self.call(&request).await?;
        if reply.success != 1 {
            return Err(SubmitError::MalformedResponse("success flag not set".into()));
        }

        // The reply carries no entity; project the snapshot locally.
        let mut entity = plan.projected(snapshot);
        entity.revision_id = reply.pageinfo.lastrevid;
        Ok(entity)
    }

    fn write_request(
        &self,
        action: Action,
        snapshot: &EntityDocument,
        options: &EditOptions,
    ) -> EditRequest {
        let mut request = EditRequest::new(action, self.config.csrf_token.clone());
        request.baserevid = (snapshot.revision_id != 0).then_some(snapshot.revision_id);
        request.summary = options.summary.clone();
        request.bot = options.bot || self.config.bot;
        request.maxlag = Some(self.config.maxlag);
        request
    }

    /// Count one edit against the budget, failing if none is left.
    fn reserve_edit(&self) -> Result<(), SubmitError> {
        let Some(max) = self.config.max_edits else {
            self.edits.fetch_add(1, Ordering::SeqCst);
            return Ok(());
        };
        self.edits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < max).then_some(n + 1)
            })
            .map(|_| ())
            .map_err(|_| {
                warn!("submit: edit budget of {max} exhausted");
                SubmitError::BudgetExhausted(max)
            })
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    /// POST `form` with retries on rate-limit replies.
    async fn call<F, R>(&self, form: &F) -> Result<R, SubmitError>
    where
        F: Serialize,
        R: DeserializeOwned,
    {
        let mut attempt: u32 = 0;
        loop {
            match self.call_once(form).await {
                Err(SubmitError::RateLimited { code, retry_after })
                    if attempt < self.config.max_retries =>
                {
                    let delay = retry_after.unwrap_or_else(|| self.backoff(attempt));
                    attempt += 1;
                    warn!(
                        "submit: {code}, retry {attempt}/{} in {}ms",
                        self.config.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn call_once<F, R>(&self, form: &F) -> Result<R, SubmitError>
    where
        F: Serialize,
        R: DeserializeOwned,
    {
        let mut request = self.client.post(&self.config.api).form(form);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(SubmitError::RateLimited {
                code: status.as_u16().to_string(),
                retry_after,
            });
        }
        if !status.is_success() {
            return Err(SubmitError::BadStatus(status.as_u16()));
        }

        let body: serde_json::Value = response.json().await?;
        if let Some(error) = body.get("error") {
            let error: ErrorBody = serde_json::from_value(error.clone())
                .map_err(|e| SubmitError::MalformedResponse(e.to_string()))?;
            return Err(SubmitError::from_body(error, retry_after));
        }
        serde_json::from_value(body).map_err(|e| SubmitError::MalformedResponse(e.to_string()))
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.config
            .retry_base
            .saturating_mul(1u32 << attempt.min(16))
            .min(MAX_BACKOFF)
    }
}

/// Parse a `Retry-After` value: delay in seconds, or an HTTP date.
///
/// A date in the past yields a zero delay.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = httpdate::parse_http_date(value).ok()?;
    Some(at.duration_since(SystemTime::now()).unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::header;
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use kbsync::{Snak, Statement, Value};
    use serde_json::json;
    use tokio::net::TcpListener;

    // -----------------------------------------------------------------------
    // Mock store
    // -----------------------------------------------------------------------

    /// Replays canned replies in order (the last one repeats) and records
    /// every request's form parameters.
    struct Mock {
        calls: Mutex<Vec<HashMap<String, String>>>,
        replies: Mutex<VecDeque<(u16, serde_json::Value)>>,
    }

    impl Mock {
        fn new(replies: Vec<(u16, serde_json::Value)>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                replies: Mutex::new(replies.into()),
            })
        }

        fn calls(&self) -> Vec<HashMap<String, String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    async fn mock_handler(
        State(mock): State<Arc<Mock>>,
        Form(params): Form<HashMap<String, String>>,
    ) -> Response {
        mock.calls.lock().unwrap().push(params);
        let (status, body) = {
            let mut replies = mock.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap()
            }
        };
        let status = axum::http::StatusCode::from_u16(status).unwrap();
        (status, [(header::RETRY_AFTER, "0")], Json(body)).into_response()
    }

    /// Spawn a loopback axum server and return its API endpoint URL.
    async fn spawn_mock_server(mock: Arc<Mock>) -> String {
        let app = Router::new()
            .route("/w/api.php", post(mock_handler))
            .with_state(mock);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/w/api.php")
    }

    fn submitter(api: String) -> EditSubmitter {
        let mut config = ClientConfig::new(api);
        config.retry_base = Duration::from_millis(1);
        config.max_retries = 3;
        EditSubmitter::new(config).unwrap()
    }

    fn stmt(value: &str) -> Statement {
        Statement::new(Snak::value("P31", Value::entity(value)))
    }

    fn snapshot() -> EntityDocument {
        let mut doc = EntityDocument::new("Q7");
        doc.revision_id = 41;
        doc.statements = vec![stmt("Q2095").with_id("Q7$a")];
        doc
    }

    fn add(value: &str) -> EntityDelta {
        EntityDelta {
            statements_to_add: vec![stmt(value)],
            ..EntityDelta::default()
        }
    }

    fn edited_entity(revision: u64) -> serde_json::Value {
        json!({
            "success": 1,
            "entity": {
                "id": "Q7",
                "lastrevid": revision,
                "claims": [
                    { "id": "Q7$a", "rank": "normal", "mainsnak": { "snaktype": "value", "property": "P31",
                      "datavalue": { "type": "wikibase-entityid", "value": { "id": "Q2095" } } } },
                    { "id": "Q7$b", "rank": "normal", "mainsnak": { "snaktype": "value", "property": "P31",
                      "datavalue": { "type": "wikibase-entityid", "value": { "id": "Q13266" } } } }
                ]
            }
        })
    }

    fn error(code: &str) -> serde_json::Value {
        json!({ "error": { "code": code, "info": format!("{code} reported") } })
    }

    // -----------------------------------------------------------------------
    // Test: an up-to-date entity produces no request
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn noop_plan_issues_no_request() {
        let mock = Mock::new(vec![(200, edited_entity(42))]);
        let api = spawn_mock_server(Arc::clone(&mock)).await;
        let submitter = submitter(api);

        let outcome = submitter
            .submit(&snapshot(), &add("Q2095"), &EditOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome, EditOutcome::NoOp(snapshot()));
        assert!(!outcome.changed());
        assert!(mock.calls().is_empty());
        assert_eq!(submitter.edits_made(), 0);
    }

    // -----------------------------------------------------------------------
    // Test: a write carries action, base revision, maxlag, token and payload
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn edit_entity_sends_revision_and_payload() {
        let mock = Mock::new(vec![(200, edited_entity(42))]);
        let api = spawn_mock_server(Arc::clone(&mock)).await;
        let submitter = submitter(api);

        let outcome = submitter
            .submit(&snapshot(), &add("Q13266"), &EditOptions::with_summary("typing"))
            .await
            .unwrap();

        let entity = outcome.entity();
        assert_eq!(entity.revision_id, 42);
        assert!(entity.statement("Q7$b").is_some());

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        let params = &calls[0];
        assert_eq!(params["action"], "wbeditentity");
        assert_eq!(params["id"], "Q7");
        assert_eq!(params["baserevid"], "41");
        assert_eq!(params["maxlag"], "5");
        assert_eq!(params["token"], "+\\");
        assert_eq!(params["summary"], "typing");
        assert!(!params.contains_key("bot"));

        let data: EditPayload = serde_json::from_str(&params["data"]).unwrap();
        assert_eq!(data.claims.len(), 1);
        assert_eq!(submitter.edits_made(), 1);
    }

    // -----------------------------------------------------------------------
    // Test: a removal-only change uses wbremoveclaims
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn removal_only_uses_remove_claims() {
        let reply = json!({ "success": 1, "pageinfo": { "lastrevid": 43 }, "claims": ["Q7$a"] });
        let mock = Mock::new(vec![(200, reply)]);
        let api = spawn_mock_server(Arc::clone(&mock)).await;
        let submitter = submitter(api);

        let delta = EntityDelta {
            statements_to_delete: vec!["Q7$a".into()],
            ..EntityDelta::default()
        };
        let outcome = submitter
            .submit(&snapshot(), &delta, &EditOptions { summary: None, bot: true })
            .await
            .unwrap();

        let entity = outcome.into_entity();
        assert_eq!(entity.revision_id, 43);
        assert!(entity.statements.is_empty());

        let calls = mock.calls();
        assert_eq!(calls[0]["action"], "wbremoveclaims");
        assert_eq!(calls[0]["claim"], "Q7$a");
        assert_eq!(calls[0]["bot"], "true");
        assert!(!calls[0].contains_key("data"));
    }

    // -----------------------------------------------------------------------
    // Test: maxlag replies are retried until the store accepts
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn maxlag_is_retried() {
        let mock = Mock::new(vec![
            (200, error("maxlag")),
            (200, error("maxlag")),
            (200, edited_entity(42)),
        ]);
        let api = spawn_mock_server(Arc::clone(&mock)).await;
        let submitter = submitter(api);

        let outcome = submitter
            .submit(&snapshot(), &add("Q13266"), &EditOptions::default())
            .await
            .unwrap();

        assert!(outcome.changed());
        assert_eq!(mock.calls().len(), 3);
    }

    #[tokio::test]
    async fn persistent_rate_limit_fails_after_retries() {
        let mock = Mock::new(vec![(429, json!({}))]);
        let api = spawn_mock_server(Arc::clone(&mock)).await;
        let submitter = submitter(api);

        let err = submitter
            .submit(&snapshot(), &add("Q13266"), &EditOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::RateLimited { ref code, .. } if code == "429"));
        assert!(err.is_retryable());
        // One attempt plus three retries.
        assert_eq!(mock.calls().len(), 4);
        assert_eq!(submitter.edits_made(), 0);
    }

    // -----------------------------------------------------------------------
    // Test: store error codes surface as typed errors
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn stale_revision_is_edit_conflict() {
        let mock = Mock::new(vec![(200, error("editconflict"))]);
        let api = spawn_mock_server(Arc::clone(&mock)).await;

        let err = submitter(api)
            .submit(&snapshot(), &add("Q13266"), &EditOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::EditConflict(_)));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn bad_token_is_auth_error() {
        let mock = Mock::new(vec![(200, error("badtoken"))]);
        let api = spawn_mock_server(mock).await;

        let err = submitter(api)
            .submit(&snapshot(), &add("Q13266"), &EditOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Auth { ref code, .. } if code == "badtoken"));
    }

    #[tokio::test]
    async fn server_error_status_is_bad_status() {
        let mock = Mock::new(vec![(500, json!({}))]);
        let api = spawn_mock_server(mock).await;

        let err = submitter(api)
            .submit(&snapshot(), &add("Q13266"), &EditOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::BadStatus(500)));
    }

    // -----------------------------------------------------------------------
    // Test: the edit budget is enforced before any request
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn budget_exhausted_before_request() {
        let mock = Mock::new(vec![(200, edited_entity(42))]);
        let api = spawn_mock_server(Arc::clone(&mock)).await;
        let mut config = ClientConfig::new(api);
        config.max_edits = Some(1);
        let submitter = EditSubmitter::new(config).unwrap();

        submitter
            .submit(&snapshot(), &add("Q13266"), &EditOptions::default())
            .await
            .unwrap();
        let err = submitter
            .submit(&snapshot(), &add("Q5"), &EditOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::BudgetExhausted(1)));
        assert_eq!(mock.calls().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Test: simulate mode sends nothing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn simulate_mode_sends_nothing() {
        let mock = Mock::new(vec![(200, edited_entity(42))]);
        let api = spawn_mock_server(Arc::clone(&mock)).await;
        let mut config = ClientConfig::new(api);
        config.simulate = true;
        let submitter = EditSubmitter::new(config).unwrap();

        let outcome = submitter
            .submit(&snapshot(), &add("Q13266"), &EditOptions::default())
            .await
            .unwrap();

        match outcome {
            EditOutcome::Simulated { payload, entity } => {
                assert_eq!(payload.claims.len(), 1);
                assert_eq!(entity.statements.len(), 2);
                assert_eq!(entity.revision_id, 41);
            }
            other => panic!("expected simulated outcome, got {other:?}"),
        }
        assert!(mock.calls().is_empty());
    }

    // -----------------------------------------------------------------------
    // Test: fetching a snapshot
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn fetch_entity_returns_snapshot() {
        let entity = edited_entity(42)["entity"].clone();
        let mock = Mock::new(vec![(200, json!({ "entities": { "Q7": entity } }))]);
        let api = spawn_mock_server(Arc::clone(&mock)).await;

        let doc = submitter(api).fetch_entity("Q7").await.unwrap();

        assert_eq!(doc.id, "Q7");
        assert_eq!(doc.revision_id, 42);
        assert_eq!(doc.statements.len(), 2);
        assert_eq!(mock.calls()[0]["action"], "wbgetentities");
        assert_eq!(mock.calls()[0]["ids"], "Q7");
    }

    #[tokio::test]
    async fn fetch_missing_entity_is_malformed() {
        let mock = Mock::new(vec![(200, json!({ "entities": {} }))]);
        let api = spawn_mock_server(mock).await;

        let err = submitter(api).fetch_entity("Q7").await.unwrap_err();
        assert!(matches!(err, SubmitError::MalformedResponse(_)));
    }

    // -----------------------------------------------------------------------
    // Retry-After parsing
    // -----------------------------------------------------------------------

    #[test]
    fn retry_after_seconds() {
        assert_eq!(parse_retry_after("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_retry_after(" 0 "), Some(Duration::ZERO));
    }

    #[test]
    fn retry_after_past_date_is_zero() {
        assert_eq!(
            parse_retry_after("Sun, 06 Nov 1994 08:49:37 GMT"),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn retry_after_future_date() {
        let at = SystemTime::now() + Duration::from_secs(3600);
        let delay = parse_retry_after(&httpdate::fmt_http_date(at)).unwrap();
        assert!(delay > Duration::from_secs(3500));
    }

    #[test]
    fn retry_after_garbage_is_ignored() {
        assert_eq!(parse_retry_after("soon"), None);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let mut config = ClientConfig::default();
        config.retry_base = Duration::from_millis(100);
        let s = EditSubmitter::with_client(Client::new(), config);
        assert_eq!(s.backoff(0), Duration::from_millis(100));
        assert_eq!(s.backoff(3), Duration::from_millis(800));
        assert_eq!(s.backoff(30), MAX_BACKOFF);
    }
}
