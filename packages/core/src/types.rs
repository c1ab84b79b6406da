//! Core data types for knowledge-base entities.
//!
//! This module defines the value model the reconciliation engine reads:
//! [`Snak`], [`SnakGroup`], [`Reference`], [`Statement`], [`MonolingualText`],
//! the [`EntityDocument`] snapshot and the caller's [`EntityDelta`]. All
//! types serialise to and from JSON using Wikibase-style field names
//! (`mainsnak`, `snaktype`, `datavalue`, `lastrevid`, ...).
//!
//! Every type is immutable input to the engine and compared structurally.
//! The one exception is [`Reference`], whose snak groups form an unordered
//! set: two references are equal when their canonical (sorted) forms are.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Priority of a statement among the statements of the same property.
///
/// Serialises as a lowercase string (e.g. `"preferred"`). `Normal` is the
/// default and acts as "unspecified" when statements are merged.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    /// Marks the statement as the best current value.
    Preferred,
    /// No particular priority. Default.
    #[default]
    Normal,
    /// Kept for the record but known to be wrong or outdated.
    Deprecated,
}

/// Formats the rank as its lowercase wire-format string.
impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rank::Preferred => write!(f, "preferred"),
            Rank::Normal => write!(f, "normal"),
            Rank::Deprecated => write!(f, "deprecated"),
        }
    }
}

/// Parses a [`Rank`] from its lowercase wire-format string.
impl std::str::FromStr for Rank {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preferred" => Ok(Rank::Preferred),
            "normal" => Ok(Rank::Normal),
            "deprecated" => Ok(Rank::Deprecated),
            _ => Err(format!(
                "unknown rank {:?}; expected one of: preferred, normal, deprecated",
                s
            )),
        }
    }
}

/// A piece of text in a given language.
///
/// Serialises as `{ "language": "de", "text": "Apfelstrudel" }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonolingualText {
    /// BCP 47-style language code, e.g. `"en"` or `"de-ch"`.
    pub language: String,
    /// The text itself.
    pub text: String,
}

impl MonolingualText {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

/// Reference to another entity, e.g. `{ "id": "Q42" }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityIdValue {
    pub id: String,
}

/// A decimal quantity with an optional unit and uncertainty bounds.
///
/// Amounts are kept as their signed decimal strings (`"+12.5"`) so that
/// equality is exact and the type stays hashable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuantityValue {
    pub amount: String,
    /// Unit entity URI, or `"1"` for dimensionless quantities.
    #[serde(default = "dimensionless")]
    pub unit: String,
    #[serde(
        rename = "upperBound",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub upper_bound: Option<String>,
    #[serde(
        rename = "lowerBound",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub lower_bound: Option<String>,
}

fn dimensionless() -> String {
    "1".into()
}

/// A point in time with a precision and calendar model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeValue {
    /// Signed ISO 8601-like timestamp, e.g. `"+2001-12-31T00:00:00Z"`.
    pub time: String,
    #[serde(default)]
    pub timezone: i32,
    #[serde(default)]
    pub before: u32,
    #[serde(default)]
    pub after: u32,
    /// 0 = billion years … 11 = day … 14 = second.
    pub precision: u8,
    pub calendarmodel: String,
}

/// The value carried by a [`Snak::Value`].
///
/// Serialises adjacently tagged: `{ "type": "string", "value": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    #[serde(rename = "wikibase-entityid")]
    EntityId(EntityIdValue),
    #[serde(rename = "string")]
    String(String),
    #[serde(rename = "monolingualtext")]
    MonolingualText(MonolingualText),
    #[serde(rename = "quantity")]
    Quantity(QuantityValue),
    #[serde(rename = "time")]
    Time(TimeValue),
}

impl Value {
    /// Shorthand for an entity-id value.
    pub fn entity(id: impl Into<String>) -> Self {
        Value::EntityId(EntityIdValue { id: id.into() })
    }
}

/// An atomic property/value assertion.
///
/// Serialises with a `snaktype` discriminator:
///
/// ```json
/// { "snaktype": "value", "property": "P31", "datavalue": { "type": "wikibase-entityid", "value": { "id": "Q5" } } }
/// { "snaktype": "somevalue", "property": "P570" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(tag = "snaktype")]
pub enum Snak {
    /// The property has this specific value.
    #[serde(rename = "value")]
    Value { property: String, datavalue: Value },
    /// The property has some value, but it is unknown.
    #[serde(rename = "somevalue")]
    SomeValue { property: String },
    /// The property has no value.
    #[serde(rename = "novalue")]
    NoValue { property: String },
}

impl Snak {
    pub fn value(property: impl Into<String>, datavalue: Value) -> Self {
        Snak::Value {
            property: property.into(),
            datavalue,
        }
    }

    pub fn some_value(property: impl Into<String>) -> Self {
        Snak::SomeValue {
            property: property.into(),
        }
    }

    pub fn no_value(property: impl Into<String>) -> Self {
        Snak::NoValue {
            property: property.into(),
        }
    }

    /// The property id this snak makes a claim about.
    pub fn property(&self) -> &str {
        match self {
            Snak::Value { property, .. }
            | Snak::SomeValue { property }
            | Snak::NoValue { property } => property,
        }
    }
}

/// An ordered list of snaks that share one property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnakGroup {
    pub property: String,
    pub snaks: Vec<Snak>,
}

impl SnakGroup {
    /// Build a group, taking the property id from the first snak.
    ///
    /// Returns `None` for an empty list. Mixed properties are not rejected
    /// here; see [`validate_document`](crate::validate_document).
    pub fn from_snaks(snaks: Vec<Snak>) -> Option<Self> {
        let property = snaks.first()?.property().to_string();
        Some(Self { property, snaks })
    }
}

/// Provenance for a statement: an unordered set of snak groups.
///
/// Equality and hashing ignore the order of the groups, so
/// `[P248: Q1, P813: t]` equals `[P813: t, P248: Q1]`. The order inside
/// each group still matters.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Reference {
    pub snaks: Vec<SnakGroup>,
}

impl Reference {
    pub fn new(snaks: Vec<SnakGroup>) -> Self {
        Self { snaks }
    }

    /// The groups in canonical (sorted) order.
    pub fn canonical(&self) -> Vec<&SnakGroup> {
        let mut groups: Vec<&SnakGroup> = self.snaks.iter().collect();
        groups.sort();
        groups
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.snaks.len() == other.snaks.len() && self.canonical() == other.canonical()
    }
}

impl Eq for Reference {}

impl Hash for Reference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

/// A claim about a subject entity, with qualifiers, references and a rank.
///
/// `id` is assigned by the remote store on the first successful write and
/// is stable afterwards. Statements built locally leave it empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Statement {
    /// Server-assigned identity (`"Q42$F078E5B3-..."`). Absent for new statements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub rank: Rank,

    #[serde(rename = "mainsnak")]
    pub main_snak: Snak,

    /// Qualifier groups in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<SnakGroup>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,

    /// Id of the entity this statement belongs to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl Statement {
    /// A normal-rank statement with no qualifiers, references or id.
    pub fn new(main_snak: Snak) -> Self {
        Self {
            id: None,
            rank: Rank::Normal,
            main_snak,
            qualifiers: Vec::new(),
            references: Vec::new(),
            subject: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_rank(mut self, rank: Rank) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_qualifiers(mut self, qualifiers: Vec<SnakGroup>) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    pub fn with_references(mut self, references: Vec<Reference>) -> Self {
        self.references = references;
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Property id of the main snak.
    pub fn property(&self) -> &str {
        self.main_snak.property()
    }

    /// Content fingerprint used to decide whether two statements make the
    /// same claim: the main snak plus the qualifier groups in canonical order.
    pub fn claim_key(&self) -> ClaimKey {
        let mut qualifiers = self.qualifiers.clone();
        qualifiers.sort();
        ClaimKey {
            main_snak: self.main_snak.clone(),
            qualifiers,
        }
    }
}

/// Canonical form of a statement's claim (main snak + sorted qualifiers).
///
/// Two statements with equal keys assert the same thing and differ at most
/// in rank, references and identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClaimKey {
    main_snak: Snak,
    qualifiers: Vec<SnakGroup>,
}

/// A snapshot of one remote entity as last fetched.
///
/// The reconciliation engine only reads snapshots; a fresh one is obtained
/// from the store's reply after every successful write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EntityDocument {
    /// Entity id, e.g. `"Q42"` or `"P31"`.
    pub id: String,

    /// Revision the snapshot was read at; sent as the base revision of the
    /// next write. `0` means unknown.
    #[serde(rename = "lastrevid", default)]
    pub revision_id: u64,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, MonolingualText>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub descriptions: BTreeMap<String, MonolingualText>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, Vec<MonolingualText>>,

    #[serde(rename = "claims", default, skip_serializing_if = "Vec::is_empty")]
    pub statements: Vec<Statement>,
}

impl EntityDocument {
    /// An empty snapshot of entity `id` at revision 0.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Statements grouped by main-snak property, in first-seen order.
    pub fn statement_groups(&self) -> Vec<(&str, Vec<&Statement>)> {
        group_by_property(&self.statements)
    }

    /// Look up a statement by its server-assigned id.
    pub fn statement(&self, id: &str) -> Option<&Statement> {
        self.statements
            .iter()
            .find(|s| s.id.as_deref() == Some(id))
    }
}

/// Group statements by main-snak property, preserving first-seen property
/// order and the order of statements within each property.
pub fn group_by_property(statements: &[Statement]) -> Vec<(&str, Vec<&Statement>)> {
    let mut groups: Vec<(&str, Vec<&Statement>)> = Vec::new();
    for s in statements {
        match groups.iter_mut().find(|(p, _)| *p == s.property()) {
            Some((_, list)) => list.push(s),
            None => groups.push((s.property(), vec![s])),
        }
    }
    groups
}

/// The change a caller wants to make to one entity.
///
/// Serialises with snake_case keys; every list defaults to empty so a
/// delta file only needs to mention what it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EntityDelta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements_to_add: Vec<Statement>,

    /// Ids of statements to remove. Unknown ids are ignored.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements_to_delete: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels_to_set: Vec<MonolingualText>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub descriptions_to_set: Vec<MonolingualText>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases_to_add: Vec<MonolingualText>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases_to_delete: Vec<MonolingualText>,
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn group(property: &str, value: &str) -> SnakGroup {
        SnakGroup {
            property: property.into(),
            snaks: vec![Snak::value(property, Value::String(value.into()))],
        }
    }

    #[test]
    fn reference_equality_ignores_group_order() {
        let a = Reference::new(vec![group("P248", "a"), group("P854", "b")]);
        let b = Reference::new(vec![group("P854", "b"), group("P248", "a")]);
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn reference_equality_respects_snak_order_inside_group() {
        let g1 = SnakGroup {
            property: "P248".into(),
            snaks: vec![
                Snak::value("P248", Value::entity("Q1")),
                Snak::value("P248", Value::entity("Q2")),
            ],
        };
        let g2 = SnakGroup {
            property: "P248".into(),
            snaks: vec![
                Snak::value("P248", Value::entity("Q2")),
                Snak::value("P248", Value::entity("Q1")),
            ],
        };
        assert_ne!(Reference::new(vec![g1]), Reference::new(vec![g2]));
    }

    #[test]
    fn claim_key_ignores_qualifier_group_order() {
        let main = Snak::value("P39", Value::entity("Q30185"));
        let a = Statement::new(main.clone())
            .with_qualifiers(vec![group("P580", "x"), group("P582", "y")]);
        let b = Statement::new(main).with_qualifiers(vec![group("P582", "y"), group("P580", "x")]);
        assert_eq!(a.claim_key(), b.claim_key());
    }

    #[test]
    fn snak_json_shape() {
        let snak = Snak::value("P31", Value::entity("Q5"));
        let json = serde_json::to_value(&snak).unwrap();
        assert_eq!(json["snaktype"], "value");
        assert_eq!(json["property"], "P31");
        assert_eq!(json["datavalue"]["type"], "wikibase-entityid");
        assert_eq!(json["datavalue"]["value"]["id"], "Q5");

        let none: Snak =
            serde_json::from_str(r#"{"snaktype":"novalue","property":"P40"}"#).unwrap();
        assert_eq!(none, Snak::no_value("P40"));
    }

    #[test]
    fn statement_defaults_when_parsing() {
        let s: Statement = serde_json::from_str(
            r#"{"mainsnak":{"snaktype":"somevalue","property":"P570"}}"#,
        )
        .unwrap();
        assert_eq!(s.rank, Rank::Normal);
        assert!(s.id.is_none());
        assert!(s.references.is_empty());
    }

    #[test]
    fn rank_round_trips_through_str() {
        for rank in [Rank::Preferred, Rank::Normal, Rank::Deprecated] {
            assert_eq!(rank.to_string().parse::<Rank>().unwrap(), rank);
        }
        assert!("best".parse::<Rank>().is_err());
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let doc = EntityDocument {
            statements: vec![
                Statement::new(Snak::no_value("P2")).with_id("a"),
                Statement::new(Snak::no_value("P1")).with_id("b"),
                Statement::new(Snak::some_value("P2")).with_id("c"),
            ],
            ..EntityDocument::new("Q1")
        };
        let groups = doc.statement_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "P2");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "P1");
        assert_eq!(doc.statement("c").map(|s| s.property()), Some("P2"));
    }
}
