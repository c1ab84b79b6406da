//! Human-readable text rendering of statements and edit plans.
//!
//! The output is stable plain text for terminals and logs. It is not a
//! canonical format; only the JSON payload is sent to the store.

use crate::plan::EditPlan;
use crate::types::{Rank, Snak, SnakGroup, Statement, Value};

/// Render a value on one line.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::EntityId(e) => e.id.clone(),
        Value::String(s) => format!("{:?}", s),
        Value::MonolingualText(m) => format!("{:?}@{}", m.text, m.language),
        Value::Quantity(q) => {
            let unit = if q.unit == "1" {
                String::new()
            } else {
                format!(" {}", short_unit(&q.unit))
            };
            match (&q.lower_bound, &q.upper_bound) {
                (Some(lo), Some(hi)) => format!("{}{} [{}, {}]", q.amount, unit, lo, hi),
                _ => format!("{}{}", q.amount, unit),
            }
        }
        Value::Time(t) => format!("{} /{}", t.time, t.precision),
    }
}

fn short_unit(unit: &str) -> &str {
    unit.rsplit('/').next().unwrap_or(unit)
}

/// Render a snak as `P31 = Q5`, `P570 = <some value>` or `P40 = <no value>`.
pub fn render_snak(snak: &Snak) -> String {
    match snak {
        Snak::Value {
            property,
            datavalue,
        } => format!("{} = {}", property, render_value(datavalue)),
        Snak::SomeValue { property } => format!("{} = <some value>", property),
        Snak::NoValue { property } => format!("{} = <no value>", property),
    }
}

fn render_group(group: &SnakGroup) -> String {
    group
        .snaks
        .iter()
        .map(render_snak)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render a statement as indented plain text.
///
/// ```text
/// P39 = Q30185  [preferred]  id: Q42$F078E5B3
///   qualifier  P580 = +2001-01-01T00:00:00Z /11
///   reference  P854 = "https://example.org"
/// ```
pub fn render_statement(statement: &Statement) -> String {
    let mut out = render_snak(&statement.main_snak);
    if statement.rank != Rank::Normal {
        out.push_str(&format!("  [{}]", statement.rank));
    }
    if let Some(id) = &statement.id {
        out.push_str(&format!("  id: {}", id));
    }
    out.push('\n');

    for group in &statement.qualifiers {
        out.push_str(&format!("  qualifier  {}\n", render_group(group)));
    }
    for reference in &statement.references {
        let parts: Vec<String> = reference.snaks.iter().map(render_group).collect();
        out.push_str(&format!("  reference  {}\n", parts.join("; ")));
    }
    out
}

/// Render an edit plan: term changes, then statements per property.
///
/// Dirty entries are marked `*`, clean ones `=`, removals `-`.
///
/// ```text
/// labels:
///   * de  "Apfelstrudel"
/// P31:
///   = P31 = Q2095  id: Q7$b
///   * P31 = Q13266
/// remove:
///   - Q7$a
/// ```
pub fn render_plan(plan: &EditPlan) -> String {
    if plan.is_empty_edit() {
        return "no changes\n".to_string();
    }

    let mut out = String::new();

    push_terms(
        &mut out,
        "labels",
        plan.terms
            .labels()
            .filter(|(_, u)| u.dirty)
            .map(|(l, u)| (l, format!("{:?}", u.value.text)))
            .collect(),
    );
    push_terms(
        &mut out,
        "descriptions",
        plan.terms
            .descriptions()
            .filter(|(_, u)| u.dirty)
            .map(|(l, u)| (l, format!("{:?}", u.value.text)))
            .collect(),
    );
    push_terms(
        &mut out,
        "aliases",
        plan.terms
            .all_aliases()
            .filter(|(_, u)| u.dirty)
            .map(|(l, u)| {
                let texts: Vec<String> = u.values.iter().map(|a| format!("{:?}", a.text)).collect();
                (l, format!("[{}]", texts.join(", ")))
            })
            .collect(),
    );

    for (property, entries) in plan.statements.groups() {
        out.push_str(property);
        out.push_str(":\n");
        for entry in entries {
            let marker = if entry.dirty { '*' } else { '=' };
            for (i, line) in render_statement(&entry.statement).lines().enumerate() {
                if i == 0 {
                    out.push_str(&format!("  {} {}\n", marker, line));
                } else {
                    out.push_str(&format!("  {}\n", line));
                }
            }
        }
    }

    if !plan.statements.to_delete().is_empty() {
        out.push_str("remove:\n");
        for id in plan.statements.to_delete() {
            out.push_str(&format!("  - {}\n", id));
        }
    }

    out
}

fn push_terms(out: &mut String, title: &str, items: Vec<(&str, String)>) {
    if items.is_empty() {
        return;
    }
    out.push_str(title);
    out.push_str(":\n");
    for (lang, text) in items {
        out.push_str(&format!("  * {}  {}\n", lang, text));
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityDelta, EntityDocument, MonolingualText, QuantityValue};

    #[test]
    fn render_snak_variants() {
        assert_eq!(render_snak(&Snak::value("P31", Value::entity("Q5"))), "P31 = Q5");
        assert_eq!(render_snak(&Snak::some_value("P570")), "P570 = <some value>");
        assert_eq!(render_snak(&Snak::no_value("P40")), "P40 = <no value>");
    }

    #[test]
    fn render_quantity_with_unit() {
        let q = Value::Quantity(QuantityValue {
            amount: "+42".into(),
            unit: "http://www.wikidata.org/entity/Q11573".into(),
            upper_bound: None,
            lower_bound: None,
        });
        assert_eq!(render_value(&q), "+42 Q11573");
    }

    #[test]
    fn render_statement_shows_rank_and_id() {
        let s = Statement::new(Snak::value("P31", Value::entity("Q5")))
            .with_rank(Rank::Preferred)
            .with_id("Q42$1");
        assert_eq!(render_statement(&s), "P31 = Q5  [preferred]  id: Q42$1\n");
    }

    #[test]
    fn render_plan_marks_dirty_entries() {
        let mut doc = EntityDocument::new("Q7");
        doc.statements = vec![
            Statement::new(Snak::value("P31", Value::entity("Q1"))).with_id("Q7$a"),
            Statement::new(Snak::value("P31", Value::entity("Q1"))).with_id("Q7$b"),
        ];
        let delta = EntityDelta {
            statements_to_add: vec![Statement::new(Snak::value("P31", Value::entity("Q2")))],
            labels_to_set: vec![MonolingualText::new("Apfelstrudel", "de")],
            ..EntityDelta::default()
        };
        let text = render_plan(&EditPlan::reconcile(&doc, &delta));

        assert!(text.contains("labels:\n  * de  \"Apfelstrudel\"\n"));
        assert!(text.contains("  * P31 = Q2\n"));
        assert!(text.contains("  = P31 = Q1  id: Q7$b\n"));
        assert!(text.contains("remove:\n  - Q7$a\n"));
    }

    #[test]
    fn render_empty_plan() {
        let doc = EntityDocument::new("Q7");
        let plan = EditPlan::reconcile(&doc, &EntityDelta::default());
        assert_eq!(render_plan(&plan), "no changes\n");
    }
}
