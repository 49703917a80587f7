// filter/evaluate.rs - In-process executor for Filter
//
// Mirrors what the SQL executor does, over JSON documents: the same
// predicates, sort keys, window and projection.

use serde_json::{Map, Value};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::database::schema::{document_timestamp, FieldKind};

use super::filter::Filter;
use super::types::{FilterOp, FilterValue, FilterWhereInfo, SortDirection};

impl Filter {
    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions().iter().all(|condition| self.matches_condition(doc, condition))
    }

    fn matches_condition(&self, doc: &Value, condition: &FilterWhereInfo) -> bool {
        let present = self
            .collection()
            .field(&condition.field)
            .and_then(|_| doc.get(&condition.field))
            .filter(|v| !v.is_null());

        let Some(actual) = present else {
            return condition.operator == FilterOp::Ne;
        };

        match compare_operand(actual, &condition.value) {
            Some(ordering) => match condition.operator {
                FilterOp::Eq => ordering == Ordering::Equal,
                FilterOp::Ne => ordering != Ordering::Equal,
                FilterOp::Gt => ordering == Ordering::Greater,
                FilterOp::Gte => ordering != Ordering::Less,
                FilterOp::Lt => ordering == Ordering::Less,
                FilterOp::Lte => ordering != Ordering::Greater,
            },
            // Type mismatch never satisfies a comparison
            None => condition.operator == FilterOp::Ne,
        }
    }

    /// Order two documents by the filter's sort keys
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for key in self.order() {
            let Some(field) = self.collection().field(&key.field) else { continue };
            let ordering = compare_values(field.kind, a.get(field.name), b.get(field.name));
            let ordering = match key.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    pub fn project(&self, doc: &Value) -> Value {
        let mut out = Map::new();
        for field in self.projected_fields() {
            if let Some(value) = doc.get(field.name) {
                out.insert(field.name.to_string(), value.clone());
            }
        }
        Value::Object(out)
    }

    /// Filter, sort, window and project a set of documents
    pub fn execute(&self, docs: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let mut matched: Vec<Value> = docs.into_iter().filter(|doc| self.matches(doc)).collect();
        matched.sort_by(|a, b| self.compare(a, b));

        let skip = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let take = self
            .limit_value()
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        matched.iter().skip(skip).take(take).map(|doc| self.project(doc)).collect()
    }

    pub fn count_matching<'a>(&self, docs: impl IntoIterator<Item = &'a Value>) -> u64 {
        docs.into_iter().filter(|doc| self.matches(doc)).count() as u64
    }
}

fn compare_operand(actual: &Value, expected: &FilterValue) -> Option<Ordering> {
    match expected {
        FilterValue::Number(n) => actual.as_f64()?.partial_cmp(n),
        FilterValue::Timestamp(t) => Some(document_timestamp(actual)?.cmp(t)),
        FilterValue::Id(id) => Some(actual.as_str()?.parse::<Uuid>().ok()?.cmp(id)),
        FilterValue::Text(s) => Some(actual.as_str()?.cmp(s.as_str())),
    }
}

/// Missing and null values sort before everything else
fn compare_values(kind: FieldKind, a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match kind {
            FieldKind::Number | FieldKind::Integer => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
            FieldKind::Timestamp => document_timestamp(a).cmp(&document_timestamp(b)),
            FieldKind::Id | FieldKind::Text => a.as_str().cmp(&b.as_str()),
        },
    }
}
