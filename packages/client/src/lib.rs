//! Client side of kbsync: pushes reconciled edits to a remote store.
//!
//! [`EditSubmitter`] takes a snapshot and a desired change, runs the
//! reconciliation engine from [`kbsync`], and sends only the resulting
//! payload. An empty plan never reaches the network.
//!
//! ```rust,ignore
//! use kbsync_client::{ClientConfig, EditOptions, EditSubmitter};
//!
//! let submitter = EditSubmitter::new(ClientConfig::from_env()?)?;
//! let snapshot = submitter.fetch_entity("Q42").await?;
//! let outcome = submitter.submit(&snapshot, &delta, &EditOptions::default()).await?;
//! let fresh = outcome.into_entity();
//! ```

pub mod config;
pub mod error;
pub mod submitter;

pub use config::{ClientConfig, ConfigError};
pub use error::SubmitError;
pub use submitter::{EditOptions, EditOutcome, EditSubmitter};
