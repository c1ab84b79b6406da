//! Failures of a submit or fetch.

use std::time::Duration;

use kbsync_api::{codes, ErrorBody};

/// Errors returned by [`EditSubmitter`](crate::EditSubmitter).
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The store rejected the session or token.
    #[error("authentication failed ({code}): {info}")]
    Auth { code: String, info: String },

    /// The entity changed since the snapshot's revision. Re-fetch and
    /// reconcile again.
    #[error("edit conflict: {0}")]
    EditConflict(String),

    /// The store asked for a back-off and the retries ran out.
    #[error("rate limited ({code})")]
    RateLimited {
        code: String,
        retry_after: Option<Duration>,
    },

    /// The store refused the edit as invalid. Retrying will not help.
    #[error("rejected by store ({code}): {info}")]
    Validation { code: String, info: String },

    /// The configured edit budget is used up.
    #[error("edit budget of {0} exhausted")]
    BudgetExhausted(u32),

    /// The HTTP request or response failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store returned a non-2xx HTTP status code.
    #[error("store returned status {0}")]
    BadStatus(u16),

    /// The reply did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The payload could not be encoded.
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SubmitError {
    /// `true` when trying again later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmitError::RateLimited { .. })
    }

    /// Map a store error body to its typed form.
    pub(crate) fn from_body(body: ErrorBody, retry_after: Option<Duration>) -> Self {
        let ErrorBody { code, info } = body;
        if codes::is_retryable(&code) {
            SubmitError::RateLimited { code, retry_after }
        } else if code == codes::EDIT_CONFLICT {
            SubmitError::EditConflict(info)
        } else if codes::is_auth(&code) {
            SubmitError::Auth { code, info }
        } else {
            SubmitError::Validation { code, info }
        }
    }
}
