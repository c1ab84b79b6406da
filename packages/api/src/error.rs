//! Standard error reply body.

use serde::{Deserialize, Serialize};

/// The JSON body returned when an action fails.
///
/// ```json
/// { "error": { "code": "maxlag", "info": "Waiting for db1: 7 seconds lagged." } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Code and human-readable description of a failed action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Machine-readable error code. See [`codes`].
    pub code: String,

    /// Human-readable description of the problem.
    #[serde(default)]
    pub info: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                info: info.into(),
            },
        }
    }
}

/// Well-known error codes.
///
/// | `code` | Meaning |
/// |--------|---------|
/// | `maxlag` | replication lag above the requested `maxlag`; retry later |
/// | `ratelimited` | too many edits in a short time; retry later |
/// | `editconflict` | the entity changed since `baserevid` |
/// | `badtoken` | CSRF token missing or invalid |
/// | `notloggedin` | the session is not authenticated |
/// | `permissiondenied` | the account may not perform this edit |
/// | `assertuserfailed` | the session expired while editing |
///
/// Any other code is a validation failure reported by the store.
pub mod codes {
    pub const MAXLAG: &str = "maxlag";
    pub const RATE_LIMITED: &str = "ratelimited";
    pub const EDIT_CONFLICT: &str = "editconflict";
    pub const BAD_TOKEN: &str = "badtoken";
    pub const NOT_LOGGED_IN: &str = "notloggedin";
    pub const PERMISSION_DENIED: &str = "permissiondenied";
    pub const ASSERT_USER_FAILED: &str = "assertuserfailed";
    pub const NO_SUCH_ENTITY: &str = "no-such-entity";
    pub const MODIFICATION_FAILED: &str = "modification-failed";

    /// The store asks the client to back off and try again.
    pub fn is_retryable(code: &str) -> bool {
        matches!(code, MAXLAG | RATE_LIMITED)
    }

    /// The session or credentials are at fault.
    pub fn is_auth(code: &str) -> bool {
        matches!(
            code,
            BAD_TOKEN | NOT_LOGGED_IN | PERMISSION_DENIED | ASSERT_USER_FAILED
        )
    }
}
