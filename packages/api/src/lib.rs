//! Request and response types for the remote entity edit API.
//!
//! The store speaks a MediaWiki-style action API: every call is a
//! form-encoded `POST` to a single endpoint, selected by its `action`
//! parameter, and every reply is JSON. This crate encodes that contract as
//! Rust types so that the submitter and the mock store in the conformance
//! suite agree on it.
//!
//! # Actions covered
//!
//! | `action` | Request | Reply |
//! |----------|---------|-------|
//! | `wbgetentities` | [`GetEntitiesRequest`] | [`GetEntitiesResponse`] |
//! | `wbeditentity` | [`EditRequest`] with `data` | [`EditEntityResponse`] |
//! | `wbremoveclaims` | [`EditRequest`] with `claim` | [`RemoveClaimsResponse`] |
//!
//! Any action may instead reply with an [`ErrorResponse`].

pub mod error;
pub mod request;
pub mod response;

pub use error::{codes, ErrorBody, ErrorResponse};
pub use request::{Action, EditRequest, GetEntitiesRequest};
pub use response::{EditEntityResponse, GetEntitiesResponse, PageInfo, RemoveClaimsResponse};
