//! Reconciliation engine for knowledge-base entities.
//!
//! Given the last-fetched snapshot of an entity and the caller's desired
//! additions and removals, this crate computes the smallest write that
//! brings the remote entity to the desired state: statements restating the
//! same claim are merged, duplicate references and aliases are dropped,
//! server-assigned statement ids are preserved, existing duplicate statements
//! are cleaned up on the properties being edited, and a change that changes
//! nothing produces no write at all.
//!
//! The crate is pure: no I/O, no shared state. Submitting the resulting
//! payload is the job of `kbsync-client`.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Value model: [`Statement`], [`Snak`], [`Reference`], [`EntityDocument`], [`EntityDelta`] |
//! | [`statement_diff`] | Per-property statement reconciliation into a [`WritePlan`] |
//! | [`term_diff`] | Label, description and alias reconciliation into a [`TermWritePlan`] |
//! | [`plan`] | [`EditPlan`], both plans computed against one snapshot |
//! | [`payload`] | Rendering the dirty parts of a plan as an [`EditPayload`] |
//! | [`validation`] | Shape checks for snapshots and deltas |
//! | [`render`] | Human-readable text rendering of statements and plans |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use kbsync::{EditPlan, EntityDelta, EntityDocument, Snak, Statement, Value};
//!
//! let snapshot: EntityDocument = serde_json::from_str(&fetched_json)?;
//! let delta = EntityDelta {
//!     statements_to_add: vec![Statement::new(Snak::value("P31", Value::entity("Q5")))],
//!     ..EntityDelta::default()
//! };
//!
//! let plan = EditPlan::reconcile(&snapshot, &delta);
//! match plan.payload() {
//!     None => println!("nothing to do"),
//!     Some(payload) => println!("{}", serde_json::to_string_pretty(&payload)?),
//! }
//! ```

pub mod payload;
pub mod plan;
pub mod render;
pub mod statement_diff;
pub mod term_diff;
pub mod types;
pub mod validation;

pub use payload::{build_payload, ClaimEdit, EditPayload};
pub use plan::EditPlan;
pub use statement_diff::{merge_statements, reconcile_statements, PlanEntry, WritePlan};
pub use term_diff::{reconcile_terms, AliasUpdate, TermUpdate, TermWritePlan};
pub use types::{
    ClaimKey, EntityDelta, EntityDocument, EntityIdValue, MonolingualText, QuantityValue, Rank,
    Reference, Snak, SnakGroup, Statement, TimeValue, Value,
};
pub use validation::{validate_delta, validate_document, ValidationError};
