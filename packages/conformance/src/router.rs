//! The mock action API endpoint.
//!
//! A single `POST /w/api.php` route dispatches on the `action` form
//! parameter. Like the real store, failures are reported with HTTP 200 and
//! an `{"error": ...}` body; `maxlag` failures also carry `Retry-After`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use kbsync_api::{codes, Action, EditRequest, ErrorResponse};
use serde_json::Value;

use crate::store::MockStore;

/// Path of the action API endpoint.
pub const API_PATH: &str = "/w/api.php";

/// Build the mock store router.
pub fn build_router(store: Arc<MockStore>) -> Router {
    Router::new()
        .route(API_PATH, post(api))
        .with_state(store)
}

async fn api(
    State(store): State<Arc<MockStore>>,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    match dispatch(&store, &params) {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) if e.error.code == codes::MAXLAG => {
            (StatusCode::OK, [(header::RETRY_AFTER, "0")], Json(e)).into_response()
        }
        Err(e) => (StatusCode::OK, Json(e)).into_response(),
    }
}

fn dispatch(store: &MockStore, params: &HashMap<String, String>) -> Result<Value, ErrorResponse> {
    let action = match params.get("action").map(String::as_str) {
        Some("wbgetentities") => Action::WbGetEntities,
        Some("wbeditentity") => Action::WbEditEntity,
        Some("wbremoveclaims") => Action::WbRemoveClaims,
        Some(other) => {
            return Err(ErrorResponse::new(
                "badvalue",
                format!("Unrecognized value for parameter \"action\": {other}."),
            ))
        }
        None => return Err(ErrorResponse::new("missingparam", "The action parameter must be set.")),
    };

    if action == Action::WbGetEntities {
        store.admit(action, None)?;
        let ids = params.get("ids").map(String::as_str).unwrap_or_default();
        return to_value(store.get_entities(ids)?);
    }

    let req = edit_request(action, params)?;
    store.admit(action, Some(&req.token))?;
    match action {
        Action::WbEditEntity => to_value(store.edit_entity(&req)?),
        _ => to_value(store.remove_claims(&req)?),
    }
}

/// Read the parameters of a write action.
fn edit_request(action: Action, params: &HashMap<String, String>) -> Result<EditRequest, ErrorResponse> {
    let token = params
        .get("token")
        .ok_or_else(|| ErrorResponse::new("missingparam", "The token parameter must be set."))?;

    let mut req = EditRequest::new(action, token.clone());
    req.id = params.get("id").cloned();
    req.data = params.get("data").cloned();
    req.claim = params.get("claim").cloned();
    req.summary = params.get("summary").cloned();
    req.bot = params.contains_key("bot");
    req.baserevid = number(params, "baserevid")?;
    req.maxlag = number(params, "maxlag")?
        .map(|n| u32::try_from(n).map_err(|_| bad_integer(&n.to_string(), "maxlag")))
        .transpose()?;
    Ok(req)
}

fn number(params: &HashMap<String, String>, name: &str) -> Result<Option<u64>, ErrorResponse> {
    params
        .get(name)
        .map(|raw| raw.parse::<u64>().map_err(|_| bad_integer(raw, name)))
        .transpose()
}

fn bad_integer(raw: &str, name: &str) -> ErrorResponse {
    ErrorResponse::new(
        "badinteger",
        format!("Invalid value \"{raw}\" for integer parameter \"{name}\"."),
    )
}

fn to_value<T: serde::Serialize>(reply: T) -> Result<Value, ErrorResponse> {
    serde_json::to_value(reply).map_err(|e| ErrorResponse::new("internal_api_error", e.to_string()))
}
