use crate::database::schema::{Collection, FieldDef, ID_FIELD};

use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOp, FilterOrderInfo, FilterValue, FilterWhereInfo, Projection, SortDirection, SqlResult};

/// A fully built, unexecuted read query against one collection
#[derive(Debug, Clone)]
pub struct Filter {
    collection: &'static Collection,
    conditions: Vec<FilterWhereInfo>,
    order: Vec<FilterOrderInfo>,
    projection: Projection,
    limit: Option<u64>,
    offset: u64,
    page_requested: bool,
}

impl Filter {
    pub fn new(collection: &'static Collection) -> Self {
        Self {
            collection,
            conditions: vec![],
            order: vec![],
            projection: Projection::All,
            limit: None,
            offset: 0,
            page_requested: false,
        }
    }

    pub fn where_op(mut self, field: impl Into<String>, operator: FilterOp, value: FilterValue) -> Self {
        self.conditions.push(FilterWhereInfo { field: field.into(), operator, value });
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: FilterValue) -> Self {
        self.where_op(field, FilterOp::Eq, value)
    }

    pub fn order_by(mut self, field: impl Into<String>, sort: SortDirection) -> Self {
        self.order.push(FilterOrderInfo { field: field.into(), sort });
        self
    }

    pub fn select(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn limit(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    pub(crate) fn mark_page_requested(&mut self) {
        self.page_requested = true;
    }

    pub(crate) fn set_order(&mut self, order: Vec<FilterOrderInfo>) {
        self.order = order;
    }

    pub fn collection(&self) -> &'static Collection {
        self.collection
    }

    pub fn conditions(&self) -> &[FilterWhereInfo] {
        &self.conditions
    }

    pub fn order(&self) -> &[FilterOrderInfo] {
        &self.order
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether the client asked for a specific page
    pub fn page_requested(&self) -> bool {
        self.page_requested
    }

    /// A requested page that starts past the last matching document
    pub fn page_out_of_range(&self, total: u64) -> bool {
        self.page_requested && self.offset > 0 && self.offset >= total
    }

    /// Fields a document carries after projection, in collection order
    pub fn projected_fields(&self) -> Vec<&'static FieldDef> {
        let collection = self.collection;
        collection
            .fields
            .iter()
            .filter(|f| match &self.projection {
                Projection::All => !collection.is_hidden(f.name),
                Projection::Include { fields, id } => {
                    if f.name == ID_FIELD { *id } else { fields.iter().any(|n| n == f.name) }
                }
                Projection::Exclude(fields) => !fields.iter().any(|n| n == f.name),
            })
            .collect()
    }

    /// `SELECT json_build_object(...) AS doc ...` with the projected fields
    pub fn to_sql(&self) -> SqlResult {
        let document = self
            .projected_fields()
            .iter()
            .map(|f| format!("'{}', \"{}\"", f.name, f.column))
            .collect::<Vec<_>>()
            .join(", ");

        let (where_clause, params) = FilterWhere::generate(self.collection, &self.conditions, 0);
        let order_clause = FilterOrder::generate(self.collection, &self.order);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT json_build_object({}) AS doc", document),
            format!("FROM \"{}\"", self.collection.table),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    /// Predicate only, with placeholders numbered after `starting_param_index`
    pub fn to_where_sql(&self, starting_param_index: usize) -> SqlResult {
        let (query, params) = FilterWhere::generate(self.collection, &self.conditions, starting_param_index);
        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let where_result = self.to_where_sql(0);
        SqlResult {
            query: format!(
                "SELECT COUNT(*) AS count FROM \"{}\" WHERE {}",
                self.collection.table, where_result.query
            ),
            params: where_result.params,
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), o) if o > 0 => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), _) => format!("LIMIT {}", l),
            (None, o) if o > 0 => format!("OFFSET {}", o),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::{USERS, WEATHER};

    #[test]
    fn builds_select_with_order_and_window() {
        let filter = Filter::new(&WEATHER)
            .where_op("temperature", FilterOp::Gte, FilterValue::Number(20.0))
            .order_by("time", SortDirection::Desc)
            .select(Projection::Include { fields: vec!["temperature".into()], id: false })
            .limit(2, 4);

        let sql = filter.to_sql();
        assert_eq!(
            sql.query,
            "SELECT json_build_object('temperature', \"temperature\") AS doc FROM \"weather\" \
             WHERE \"temperature\" >= $1 ORDER BY \"time\" DESC NULLS LAST LIMIT 2 OFFSET 4"
        );
        assert_eq!(sql.params, vec![FilterValue::Number(20.0)]);
    }

    #[test]
    fn default_projection_hides_version() {
        let names: Vec<_> = Filter::new(&WEATHER).projected_fields().iter().map(|f| f.name).collect();
        assert!(names.contains(&"_id"));
        assert!(!names.contains(&"__v"));

        let names: Vec<_> = Filter::new(&WEATHER)
            .select(Projection::Exclude(vec!["_id".into()]))
            .projected_fields()
            .iter()
            .map(|f| f.name)
            .collect();
        assert!(!names.contains(&"_id"));
        assert!(names.contains(&"__v"));
    }

    #[test]
    fn count_sql_ignores_window() {
        let filter = Filter::new(&USERS)
            .where_eq("role", FilterValue::Text("student".into()))
            .limit(10, 20);
        assert_eq!(
            filter.to_count_sql().query,
            "SELECT COUNT(*) AS count FROM \"users\" WHERE \"role\" = $1"
        );
    }
}
