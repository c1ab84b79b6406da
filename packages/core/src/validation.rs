use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::types::{EntityDelta, EntityDocument, MonolingualText, Snak, SnakGroup, Statement};

/// Errors returned when a snapshot or delta is malformed.
///
/// The reconciliation engine accepts any input; these checks catch data
/// that the store would reject or that makes reconciliation meaningless.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("entity id must look like Q123, P123 or L123, got: {0:?}")]
    InvalidEntityId(String),

    #[error("property id must look like P123, got: {0:?}")]
    InvalidPropertyId(String),

    #[error("snak group for {group} contains a snak for {found}")]
    MixedSnakGroup { group: String, found: String },

    #[error("snak group for {0} is empty")]
    EmptySnakGroup(String),

    #[error("statement {statement} belongs to {subject}, not to {entity}")]
    SubjectMismatch {
        statement: String,
        subject: String,
        entity: String,
    },

    #[error("statement id must not be empty")]
    EmptyStatementId,

    #[error("language code must not be empty")]
    EmptyLanguage,

    #[error("term text for language {0:?} must not be empty")]
    EmptyText(String),

    #[error("term stored under {key:?} is tagged with language {found:?}")]
    LanguageMismatch { key: String, found: String },
}

/// Validate a snapshot. Returns the first problem found.
pub fn validate_document(doc: &EntityDocument) -> Result<(), ValidationError> {
    validate_entity_id(&doc.id)?;

    for (key, term) in doc.labels.iter().chain(doc.descriptions.iter()) {
        validate_keyed_term(key, term)?;
    }
    for (key, aliases) in &doc.aliases {
        for alias in aliases {
            validate_keyed_term(key, alias)?;
        }
    }

    for statement in &doc.statements {
        if statement.id.as_deref() == Some("") {
            return Err(ValidationError::EmptyStatementId);
        }
        validate_statement(statement, &doc.id)?;
    }

    Ok(())
}

/// Validate a delta meant for entity `subject`. Returns the first problem found.
pub fn validate_delta(delta: &EntityDelta, subject: &str) -> Result<(), ValidationError> {
    validate_entity_id(subject)?;

    for statement in &delta.statements_to_add {
        validate_statement(statement, subject)?;
    }
    if delta.statements_to_delete.iter().any(String::is_empty) {
        return Err(ValidationError::EmptyStatementId);
    }

    let terms = delta
        .labels_to_set
        .iter()
        .chain(&delta.descriptions_to_set)
        .chain(&delta.aliases_to_add)
        .chain(&delta.aliases_to_delete);
    for term in terms {
        validate_term(term)?;
    }

    Ok(())
}

// --- helpers -----------------------------------------------------------------

fn validate_statement(statement: &Statement, entity: &str) -> Result<(), ValidationError> {
    if let Some(subject) = &statement.subject {
        if subject != entity {
            return Err(ValidationError::SubjectMismatch {
                statement: statement.id.clone().unwrap_or_else(|| "(new)".into()),
                subject: subject.clone(),
                entity: entity.to_string(),
            });
        }
    }

    validate_snak(&statement.main_snak)?;
    for group in &statement.qualifiers {
        validate_group(group)?;
    }
    for reference in &statement.references {
        for group in &reference.snaks {
            validate_group(group)?;
        }
    }
    Ok(())
}

fn validate_group(group: &SnakGroup) -> Result<(), ValidationError> {
    validate_property_id(&group.property)?;
    if group.snaks.is_empty() {
        return Err(ValidationError::EmptySnakGroup(group.property.clone()));
    }
    for snak in &group.snaks {
        if snak.property() != group.property {
            return Err(ValidationError::MixedSnakGroup {
                group: group.property.clone(),
                found: snak.property().to_string(),
            });
        }
    }
    Ok(())
}

fn validate_snak(snak: &Snak) -> Result<(), ValidationError> {
    validate_property_id(snak.property())
}

fn validate_keyed_term(key: &str, term: &MonolingualText) -> Result<(), ValidationError> {
    validate_term(term)?;
    if key != term.language {
        return Err(ValidationError::LanguageMismatch {
            key: key.to_string(),
            found: term.language.clone(),
        });
    }
    Ok(())
}

fn validate_term(term: &MonolingualText) -> Result<(), ValidationError> {
    if term.language.is_empty() {
        return Err(ValidationError::EmptyLanguage);
    }
    if term.text.trim().is_empty() {
        return Err(ValidationError::EmptyText(term.language.clone()));
    }
    Ok(())
}

fn validate_entity_id(id: &str) -> Result<(), ValidationError> {
    if ENTITY_ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEntityId(id.to_string()))
    }
}

fn validate_property_id(id: &str) -> Result<(), ValidationError> {
    if PROPERTY_ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPropertyId(id.to_string()))
    }
}

/// `^[QPL][1-9][0-9]*$`
static ENTITY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[QPL][1-9][0-9]*$").expect("invalid entity id regex"));

/// `^P[1-9][0-9]*$`
static PROPERTY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^P[1-9][0-9]*$").expect("invalid property id regex"));

// --- tests -------------------------------------------------------------------
