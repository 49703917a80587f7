use crate::database::schema::{Collection, FieldKind};

use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse `-time,deviceName` into sort keys, in listed order
    pub fn parse(spec: &str) -> Vec<FilterOrderInfo> {
        spec.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty() && *part != "-")
            .map(|part| match part.strip_prefix('-') {
                Some(field) => FilterOrderInfo { field: field.to_string(), sort: SortDirection::Desc },
                None => FilterOrderInfo { field: part.to_string(), sort: SortDirection::Asc },
            })
            .collect()
    }

    /// Nulls sort as the smallest value in both directions; text compares
    /// byte-wise so the order matches the in-process evaluator
    pub fn generate(collection: &Collection, infos: &[FilterOrderInfo]) -> String {
        // Sorting on a field no document has is a no-op
        let parts: Vec<String> = infos
            .iter()
            .filter_map(|info| {
                let field = collection.field(&info.field)?;
                Some(format!(
                    "\"{}\"{} {} {}",
                    field.column,
                    collate(field.kind),
                    info.sort.to_sql(),
                    nulls(info.sort)
                ))
            })
            .collect();

        if parts.is_empty() {
            return String::new();
        }
        format!("ORDER BY {}", parts.join(", "))
    }
}

fn collate(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => " COLLATE \"C\"",
        _ => "",
    }
}

fn nulls(sort: SortDirection) -> &'static str {
    match sort {
        SortDirection::Asc => "NULLS FIRST",
        SortDirection::Desc => "NULLS LAST",
    }
}
