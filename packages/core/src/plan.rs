//! The combined write plan for one edit of one entity.

use crate::payload::{build_payload, EditPayload};
use crate::statement_diff::{reconcile_statements, WritePlan};
use crate::term_diff::{reconcile_terms, TermWritePlan};
use crate::types::{EntityDelta, EntityDocument};

/// Statement and term plans computed against the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPlan {
    pub statements: WritePlan,
    pub terms: TermWritePlan,
}

impl EditPlan {
    /// Reconcile `delta` against `snapshot`. Pure; the snapshot is not touched.
    pub fn reconcile(snapshot: &EntityDocument, delta: &EntityDelta) -> Self {
        let statements = reconcile_statements(
            &snapshot.statements,
            &delta.statements_to_add,
            &delta.statements_to_delete,
        );
        let terms = reconcile_terms(
            snapshot,
            &delta.labels_to_set,
            &delta.descriptions_to_set,
            &delta.aliases_to_add,
            &delta.aliases_to_delete,
        );
        Self { statements, terms }
    }

    /// `true` when there is nothing to send. Callers must skip the write.
    pub fn is_empty_edit(&self) -> bool {
        self.statements.is_empty_edit() && self.terms.is_empty_edit()
    }

    /// Wire payload for the dirty parts, or `None` for an empty edit.
    pub fn payload(&self) -> Option<EditPayload> {
        build_payload(&self.statements, &self.terms)
    }

    /// The entity as it would look after this plan is written.
    ///
    /// New statements appear without an id (the store assigns one).
    /// Statements are ordered by property id; the revision id is unchanged.
    pub fn projected(&self, snapshot: &EntityDocument) -> EntityDocument {
        EntityDocument {
            id: snapshot.id.clone(),
            revision_id: snapshot.revision_id,
            labels: self
                .terms
                .labels()
                .map(|(lang, u)| (lang.to_string(), u.value.clone()))
                .collect(),
            descriptions: self
                .terms
                .descriptions()
                .map(|(lang, u)| (lang.to_string(), u.value.clone()))
                .collect(),
            aliases: self
                .terms
                .all_aliases()
                .filter(|(_, u)| !u.values.is_empty())
                .map(|(lang, u)| (lang.to_string(), u.values.clone()))
                .collect(),
            statements: self.statements.kept_statements().cloned().collect(),
        }
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MonolingualText, Rank, Reference, Snak, SnakGroup, Statement, Value};

    fn stmt(property: &str, value: &str) -> Statement {
        Statement::new(Snak::value(property, Value::entity(value)))
    }

    fn snapshot() -> EntityDocument {
        let mut doc = EntityDocument::new("Q7");
        doc.revision_id = 41;
        doc.labels
            .insert("en".into(), MonolingualText::new("apple strudel", "en"));
        doc.statements = vec![
            stmt("P31", "Q2095").with_id("Q7$a"),
            stmt("P31", "Q2095").with_id("Q7$b"),
            stmt("P495", "Q40").with_id("Q7$c").with_rank(Rank::Preferred),
        ];
        doc
    }

    fn delta() -> EntityDelta {
        let source = Reference::new(vec![SnakGroup {
            property: "P854".into(),
            snaks: vec![Snak::value("P854", Value::String("https://example.org".into()))],
        }]);
        EntityDelta {
            statements_to_add: vec![
                stmt("P31", "Q2095"),
                stmt("P495", "Q40").with_references(vec![source]),
                stmt("P279", "Q13266"),
                stmt("P279", "Q13266"),
            ],
            statements_to_delete: vec!["Q7$missing".into()],
            labels_to_set: vec![MonolingualText::new("Apfelstrudel", "de")],
            aliases_to_add: vec![
                MonolingualText::new("strudel", "en"),
                MonolingualText::new("Strudel", "de"),
            ],
            ..EntityDelta::default()
        }
    }

    /// Simulate the store: give every id-less statement a fresh id.
    fn apply(plan: &EditPlan, snapshot: &EntityDocument) -> EntityDocument {
        let mut next = plan.projected(snapshot);
        for (i, s) in next.statements.iter_mut().enumerate() {
            if s.id.is_none() {
                s.id = Some(format!("Q7$new{i}"));
            }
        }
        next.revision_id += 1;
        next
    }

    #[test]
    fn reconciling_twice_yields_empty_plan() {
        let snap = snapshot();
        let first = EditPlan::reconcile(&snap, &delta());
        assert!(!first.is_empty_edit());

        let after = apply(&first, &snap);
        let second = EditPlan::reconcile(&after, &delta());
        assert!(second.is_empty_edit(), "second plan: {second:?}");
        assert!(second.payload().is_none());
    }

    #[test]
    fn projection_reflects_merges_and_cleanup() {
        let snap = snapshot();
        let plan = EditPlan::reconcile(&snap, &delta());
        let projected = plan.projected(&snap);

        assert_eq!(plan.statements.to_delete(), &["Q7$a".to_string()]);
        assert_eq!(projected.statements.len(), 3);
        assert_eq!(
            projected.statement("Q7$c").map(|s| s.references.len()),
            Some(1)
        );
        assert_eq!(projected.labels["de"].text, "Apfelstrudel");
        assert_eq!(projected.aliases["en"][0].text, "strudel");
        assert_eq!(projected.aliases["de"][0].text, "Strudel");
        assert_eq!(projected.revision_id, 41);
    }

    #[test]
    fn empty_delta_is_empty_edit() {
        let snap = snapshot();
        let plan = EditPlan::reconcile(&snap, &EntityDelta::default());
        assert!(plan.is_empty_edit());
        assert!(plan.payload().is_none());
        assert_eq!(plan.projected(&snap).statements, snap.statements);
    }

    #[test]
    fn label_only_edit_keeps_statements() {
        let snap = snapshot();
        let delta = EntityDelta {
            labels_to_set: vec![MonolingualText::new("Apfelstrudel", "de")],
            ..EntityDelta::default()
        };
        let plan = EditPlan::reconcile(&snap, &delta);

        assert!(plan.statements.is_empty_edit());
        let payload = plan.payload().unwrap();
        assert!(!payload.is_removal_only());
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("claims").is_none(), "payload: {json}");
        assert_eq!(json["labels"]["de"]["text"], "Apfelstrudel");
    }

    #[test]
    fn restated_statement_with_subject_is_empty_edit() {
        let snap = snapshot();
        let delta = EntityDelta {
            statements_to_add: vec![stmt("P495", "Q40")
                .with_rank(Rank::Preferred)
                .with_subject("Q7")],
            ..EntityDelta::default()
        };
        let plan = EditPlan::reconcile(&snap, &delta);
        assert!(plan.is_empty_edit(), "plan: {plan:?}");
        assert!(plan.payload().is_none());
    }
}
