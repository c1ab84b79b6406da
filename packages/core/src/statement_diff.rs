//! Statement reconciliation: from a snapshot and a desired delta to a
//! minimal per-property write plan.
//!
//! Matching is scoped to one property at a time, and only properties that
//! receive additions are reconciled; every other property is carried over
//! clean, duplicates included. Within a reconciled property the engine
//! folds every statement, additions first and then the surviving current
//! statements, into a list of *slots*. A slot is either merged with
//! an incoming statement (same claim, compatible rank) or a new slot is
//! opened. The fold threads an index from [`ClaimKey`] to slot positions and
//! an index from statement id to slot position, so nothing is removed from
//! a list while it is being scanned.
//!
//! Precedence, per property:
//!
//! 1. An addition carrying an explicit id takes over the current statement
//!    with that id. Such a slot is *pinned*: content matching never merges
//!    anything into it.
//! 2. Current statements listed for deletion are dropped and their ids
//!    recorded. Unknown ids are ignored.
//! 3. Id-less additions and current statements merge when their claims are
//!    equal and their ranks compatible (equal, or one side `Normal`).
//!    The merged statement keeps the existing id, the non-default rank and
//!    the deduplicated union of references.
//! 4. Two current statements that merge leave one survivor; the other id is
//!    scheduled for deletion. This cleanup only happens on properties with
//!    additions.
//!
//! Whatever is left over survives unchanged and clean.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::types::{group_by_property, ClaimKey, Rank, Reference, Statement};

/// One statement the entity will carry after the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub statement: Statement,
    /// `true` when the statement must be sent to the store.
    pub dirty: bool,
}

/// The statement part of a write plan.
///
/// `entries` maps each property id to the statements to keep, in order:
/// additions first (submission order), then surviving current statements
/// (snapshot order). `to_delete` lists statement ids to remove outright.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WritePlan {
    entries: BTreeMap<String, Vec<PlanEntry>>,
    to_delete: Vec<String>,
}

impl WritePlan {
    /// Entries kept for `property`; empty if the property is untouched and absent.
    pub fn entries(&self, property: &str) -> &[PlanEntry] {
        self.entries.get(property).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All properties with their kept entries, ordered by property id.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[PlanEntry])> {
        self.entries
            .iter()
            .map(|(p, entries)| (p.as_str(), entries.as_slice()))
    }

    /// Statement ids to remove, in the order they were decided.
    pub fn to_delete(&self) -> &[String] {
        &self.to_delete
    }

    /// Statements that must be written.
    pub fn dirty_statements(&self) -> impl Iterator<Item = &Statement> {
        self.entries
            .values()
            .flatten()
            .filter(|e| e.dirty)
            .map(|e| &e.statement)
    }

    /// Every statement the entity carries after the write, dirty or not.
    pub fn kept_statements(&self) -> impl Iterator<Item = &Statement> {
        self.entries.values().flatten().map(|e| &e.statement)
    }

    /// `true` when nothing is deleted and no entry is dirty.
    pub fn is_empty_edit(&self) -> bool {
        self.to_delete.is_empty() && self.dirty_statements().next().is_none()
    }
}

/// Reconcile `current` statements with the caller's additions and deletions.
///
/// Pure: reads its inputs and returns a fresh [`WritePlan`].
///
/// An addition whose id is also listed in `to_delete` is dropped; the
/// deletion wins. When two additions carry the same explicit id, the later
/// one wins.
pub fn reconcile_statements(
    current: &[Statement],
    to_add: &[Statement],
    to_delete: &[String],
) -> WritePlan {
    let delete: HashSet<&str> = to_delete.iter().map(String::as_str).collect();

    let mut plan = WritePlan::default();
    let mut deleted: HashSet<&str> = HashSet::new();
    let mut surviving: Vec<Statement> = Vec::with_capacity(current.len());
    for s in current {
        match s.id.as_deref() {
            Some(id) if delete.contains(id) => {
                if deleted.insert(id) {
                    plan.to_delete.push(id.to_string());
                }
            }
            _ => surviving.push(s.clone()),
        }
    }

    let additions: Vec<Statement> = to_add
        .iter()
        .filter(|s| s.id.as_deref().map_or(true, |id| !delete.contains(id)))
        .cloned()
        .collect();

    let current_groups = group_by_property(&surviving);
    let addition_groups = group_by_property(&additions);

    // Properties without additions are carried over as they are.
    for (property, olds) in &current_groups {
        if !lookup(&addition_groups, property).is_empty() {
            continue;
        }
        let entries = olds
            .iter()
            .map(|s| PlanEntry {
                statement: (*s).clone(),
                dirty: false,
            })
            .collect();
        plan.entries.insert(property.to_string(), entries);
    }

    for (property, news) in &addition_groups {
        let olds = lookup(&current_groups, property);

        let fold = news
            .iter()
            .map(|s| (*s, true))
            .chain(olds.iter().map(|s| (*s, false)))
            .fold(GroupFold::default(), |acc, (s, is_new)| acc.absorb(s, is_new));

        for id in fold.deletions {
            if !plan.to_delete.contains(&id) {
                plan.to_delete.push(id);
            }
        }
        let entries: Vec<PlanEntry> = fold
            .slots
            .into_iter()
            .map(|slot| PlanEntry {
                statement: slot.statement,
                dirty: slot.dirty,
            })
            .collect();
        if !entries.is_empty() {
            plan.entries.insert(property.to_string(), entries);
        }
    }

    plan
}

fn lookup<'a, 'b>(
    groups: &'b [(&str, Vec<&'a Statement>)],
    property: &str,
) -> &'b [&'a Statement] {
    groups
        .iter()
        .find(|(p, _)| *p == property)
        .map(|(_, list)| list.as_slice())
        .unwrap_or(&[])
}

/// Merge two statements making the same claim.
///
/// Returns `None` when the ranks conflict. The result carries `incoming`'s
/// claim, `incoming`'s id (falling back to `existing`'s), the non-default
/// rank, and `incoming`'s references followed by those of `existing` not
/// already present.
pub fn merge_statements(incoming: &Statement, existing: &Statement) -> Option<Statement> {
    let rank = merge_rank(incoming.rank, existing.rank)?;

    let mut references: Vec<Reference> = incoming.references.clone();
    for r in &existing.references {
        if !references.contains(r) {
            references.push(r.clone());
        }
    }

    Some(Statement {
        id: incoming.id.clone().or_else(|| existing.id.clone()),
        rank,
        main_snak: incoming.main_snak.clone(),
        qualifiers: incoming.qualifiers.clone(),
        references,
        subject: incoming.subject.clone().or_else(|| existing.subject.clone()),
    })
}

/// Equality of everything the store keeps for a statement. `subject` only
/// names the owning entity and never makes a write necessary.
fn same_content(a: &Statement, b: &Statement) -> bool {
    a.id == b.id
        && a.rank == b.rank
        && a.main_snak == b.main_snak
        && a.qualifiers == b.qualifiers
        && a.references == b.references
}

fn merge_rank(a: Rank, b: Rank) -> Option<Rank> {
    match (a, b) {
        (Rank::Normal, other) | (other, Rank::Normal) => Some(other),
        (a, b) if a == b => Some(a),
        _ => None,
    }
}

// --- fold state --------------------------------------------------------------

struct Slot {
    statement: Statement,
    dirty: bool,
    /// Set by an explicit-id addition; excluded from content matching.
    pinned: bool,
}

#[derive(Default)]
struct GroupFold {
    slots: Vec<Slot>,
    by_claim: HashMap<ClaimKey, Vec<usize>>,
    by_id: HashMap<String, usize>,
    deletions: Vec<String>,
}

impl GroupFold {
    fn absorb(mut self, statement: &Statement, is_new: bool) -> Self {
        if let Some(id) = statement.id.as_deref() {
            if let Some(&i) = self.by_id.get(id) {
                self.take_over(i, statement, is_new);
                return self;
            }
            if is_new {
                self.open(statement.clone(), true, true);
                return self;
            }
        }

        let key = statement.claim_key();
        let candidates = self.by_claim.get(&key).cloned().unwrap_or_default();
        for i in candidates {
            if self.slots[i].pinned {
                continue;
            }
            if let Some(merged) = merge_statements(statement, &self.slots[i].statement) {
                self.merge_into(i, statement, merged, is_new);
                return self;
            }
        }

        self.open(statement.clone(), is_new, false);
        self
    }

    /// A statement whose id already owns slot `i`.
    fn take_over(&mut self, i: usize, statement: &Statement, is_new: bool) {
        let slot = &mut self.slots[i];
        if is_new {
            // Two additions with the same id: the later one replaces the earlier.
            slot.statement = statement.clone();
            slot.dirty = true;
        } else {
            // The current statement the pinned addition replaces.
            slot.dirty = !same_content(&slot.statement, statement);
        }
    }

    fn merge_into(&mut self, i: usize, incoming: &Statement, merged: Statement, is_new: bool) {
        let slot = &mut self.slots[i];
        let dirty = (is_new || !same_content(&merged, incoming))
            && (slot.dirty || !same_content(&merged, &slot.statement));

        let previous_id = slot.statement.id.clone();
        let merged_id = merged.id.clone();
        slot.statement = merged;
        slot.dirty = dirty;

        if let Some(prev) = previous_id {
            if merged_id.as_deref() != Some(prev.as_str()) {
                self.by_id.remove(&prev);
                self.deletions.push(prev);
            }
        }
        if let Some(id) = merged_id {
            self.by_id.insert(id, i);
        }
    }

    fn open(&mut self, statement: Statement, dirty: bool, pinned: bool) {
        let i = self.slots.len();
        if let Some(id) = &statement.id {
            self.by_id.insert(id.clone(), i);
        }
        if !pinned {
            self.by_claim.entry(statement.claim_key()).or_default().push(i);
        }
        self.slots.push(Slot {
            statement,
            dirty,
            pinned,
        });
    }
}

// --- tests -------------------------------------------------------------------
