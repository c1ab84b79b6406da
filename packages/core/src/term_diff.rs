//! Term reconciliation: labels, descriptions and aliases.
//!
//! The plan starts from the snapshot's terms (all clean) and applies the
//! caller's changes in a fixed order: labels, descriptions, alias additions,
//! alias deletions. Every language entry records whether it changed.
//!
//! Store-level expectations shape the alias rules:
//!
//! - an entity carries a label before it carries aliases, so an alias for a
//!   language without a label becomes the label;
//! - an alias never repeats the label, so an alias equal to the label is
//!   dropped, and a new label equal to an existing alias removes that alias.

use std::collections::BTreeMap;

use crate::types::{EntityDocument, MonolingualText};

/// Label or description for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermUpdate {
    pub value: MonolingualText,
    pub dirty: bool,
}

/// Alias list for one language.
///
/// When dirty, the whole list is sent; an empty list clears the language.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AliasUpdate {
    /// Resulting aliases, in insertion order.
    pub values: Vec<MonolingualText>,
    /// Aliases appended by this plan.
    pub added: Vec<MonolingualText>,
    /// Aliases removed by this plan (deleted or demoted to label).
    pub deleted: Vec<MonolingualText>,
    pub dirty: bool,
}

impl AliasUpdate {
    fn contains_text(&self, text: &str) -> bool {
        self.values.iter().any(|a| a.text == text)
    }

    fn remove(&mut self, alias: &MonolingualText) -> bool {
        let before = self.values.len();
        self.values.retain(|a| a.text != alias.text);
        if self.values.len() == before {
            return false;
        }
        self.added.retain(|a| a.text != alias.text);
        self.deleted.push(alias.clone());
        self.dirty = true;
        true
    }
}

/// The term part of a write plan, keyed by language code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TermWritePlan {
    labels: BTreeMap<String, TermUpdate>,
    descriptions: BTreeMap<String, TermUpdate>,
    aliases: BTreeMap<String, AliasUpdate>,
}

impl TermWritePlan {
    pub fn label(&self, language: &str) -> Option<&TermUpdate> {
        self.labels.get(language)
    }

    pub fn description(&self, language: &str) -> Option<&TermUpdate> {
        self.descriptions.get(language)
    }

    pub fn aliases(&self, language: &str) -> Option<&AliasUpdate> {
        self.aliases.get(language)
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, &TermUpdate)> {
        self.labels.iter().map(|(l, u)| (l.as_str(), u))
    }

    pub fn descriptions(&self) -> impl Iterator<Item = (&str, &TermUpdate)> {
        self.descriptions.iter().map(|(l, u)| (l.as_str(), u))
    }

    pub fn all_aliases(&self) -> impl Iterator<Item = (&str, &AliasUpdate)> {
        self.aliases.iter().map(|(l, u)| (l.as_str(), u))
    }

    /// `true` when no label, description or alias list changed.
    pub fn is_empty_edit(&self) -> bool {
        self.labels.values().all(|u| !u.dirty)
            && self.descriptions.values().all(|u| !u.dirty)
            && self.aliases.values().all(|u| !u.dirty)
    }
}

/// Reconcile the snapshot's terms with the caller's term changes.
pub fn reconcile_terms(
    current: &EntityDocument,
    labels_to_set: &[MonolingualText],
    descriptions_to_set: &[MonolingualText],
    aliases_to_add: &[MonolingualText],
    aliases_to_delete: &[MonolingualText],
) -> TermWritePlan {
    let mut plan = TermWritePlan {
        labels: clean_terms(&current.labels),
        descriptions: clean_terms(&current.descriptions),
        aliases: current
            .aliases
            .iter()
            .map(|(lang, values)| {
                let update = AliasUpdate {
                    values: values.clone(),
                    ..AliasUpdate::default()
                };
                (lang.clone(), update)
            })
            .collect(),
    };

    for label in labels_to_set {
        plan.set_label(label);
    }
    for description in descriptions_to_set {
        set_term(&mut plan.descriptions, description);
    }
    for alias in aliases_to_add {
        plan.add_alias(alias);
    }
    for alias in aliases_to_delete {
        plan.delete_alias(alias);
    }

    // An alias list that ends up as it started is not rewritten.
    for (lang, update) in plan.aliases.iter_mut() {
        let original = current.aliases.get(lang).map(Vec::as_slice).unwrap_or(&[]);
        update.dirty = update.dirty && update.values != original;
    }

    plan
}

fn clean_terms(terms: &BTreeMap<String, MonolingualText>) -> BTreeMap<String, TermUpdate> {
    terms
        .iter()
        .map(|(lang, value)| {
            let update = TermUpdate {
                value: value.clone(),
                dirty: false,
            };
            (lang.clone(), update)
        })
        .collect()
}

/// Replace the value for the term's language. Returns `true` if it changed.
fn set_term(terms: &mut BTreeMap<String, TermUpdate>, value: &MonolingualText) -> bool {
    if let Some(existing) = terms.get(&value.language) {
        if existing.value.text == value.text {
            return false;
        }
    }
    terms.insert(
        value.language.clone(),
        TermUpdate {
            value: value.clone(),
            dirty: true,
        },
    );
    true
}

impl TermWritePlan {
    fn set_label(&mut self, label: &MonolingualText) {
        if !set_term(&mut self.labels, label) {
            return;
        }
        // The new label must not linger as an alias.
        if let Some(aliases) = self.aliases.get_mut(&label.language) {
            aliases.remove(label);
        }
    }

    fn add_alias(&mut self, alias: &MonolingualText) {
        let Some(label) = self.labels.get(&alias.language) else {
            // No label yet: the alias becomes the label.
            self.labels.insert(
                alias.language.clone(),
                TermUpdate {
                    value: alias.clone(),
                    dirty: true,
                },
            );
            return;
        };
        if label.value.text == alias.text {
            return;
        }

        let aliases = self.aliases.entry(alias.language.clone()).or_default();
        if aliases.contains_text(&alias.text) {
            return;
        }
        aliases.values.push(alias.clone());
        aliases.added.push(alias.clone());
        aliases.dirty = true;
    }

    fn delete_alias(&mut self, alias: &MonolingualText) {
        if let Some(aliases) = self.aliases.get_mut(&alias.language) {
            aliases.remove(alias);
        }
    }
}

// --- tests -------------------------------------------------------------------
