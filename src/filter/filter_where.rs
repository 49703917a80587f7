use crate::database::schema::Collection;

use super::types::{FilterOp, FilterValue, FilterWhereInfo};

pub struct FilterWhere {
    param_values: Vec<FilterValue>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render conditions as a SQL predicate with `$n` placeholders numbered
    /// after `starting_param_index`.
    pub fn generate(
        collection: &Collection,
        conditions: &[FilterWhereInfo],
        starting_param_index: usize,
    ) -> (String, Vec<FilterValue>) {
        let mut filter_where = Self::new(starting_param_index);
        let sql_conditions: Vec<String> = conditions
            .iter()
            .map(|condition| filter_where.build_sql_condition(collection, condition))
            .collect();

        let where_clause = if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") };
        (where_clause, filter_where.param_values)
    }

    fn build_sql_condition(&mut self, collection: &Collection, condition: &FilterWhereInfo) -> String {
        // Unknown fields are never present on a document
        let Some(field) = collection.field(&condition.field) else {
            return match condition.operator {
                FilterOp::Ne => "1=1".to_string(),
                _ => "1=0".to_string(),
            };
        };

        format!(
            "\"{}\" {} {}",
            field.column,
            condition.operator.to_sql(),
            self.param(condition.value.clone())
        )
    }

    fn param(&mut self, value: FilterValue) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}
