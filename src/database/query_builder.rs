use serde_json::Value;
use sqlx::{postgres::PgArguments, PgPool, Postgres, Row};

use crate::filter::{Filter, FilterValue};

/// Executes Filter reads and filtered writes against Postgres
pub struct QueryBuilder<'a> {
    pool: &'a PgPool,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Projected documents, in filter order
    pub async fn select_all(&self, filter: &Filter) -> Result<Vec<Value>, sqlx::Error> {
        let sql_result = filter.to_sql();
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let rows = q.fetch_all(self.pool).await?;
        rows.iter().map(|row| row.try_get::<Value, _>("doc")).collect()
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64, sqlx::Error> {
        let sql_result = filter.to_count_sql();
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    /// `UPDATE ... SET col = $1, ... WHERE <filter>`; returns affected rows
    pub async fn update_where(&self, filter: &Filter, assignments: &[(&str, FilterValue)]) -> Result<u64, sqlx::Error> {
        let set_clause = assignments
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("\"{}\" = ${}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let where_result = filter.to_where_sql(assignments.len());
        let query = format!(
            "UPDATE \"{}\" SET {} WHERE {}",
            filter.collection().table,
            set_clause,
            where_result.query
        );

        let mut q = sqlx::query(&query);
        for (_, value) in assignments {
            q = bind_param_query(q, value);
        }
        for p in where_result.params.iter() {
            q = bind_param_query(q, p);
        }
        Ok(q.execute(self.pool).await?.rows_affected())
    }

    pub async fn delete_where(&self, filter: &Filter) -> Result<u64, sqlx::Error> {
        let where_result = filter.to_where_sql(0);
        let query = format!("DELETE FROM \"{}\" WHERE {}", filter.collection().table, where_result.query);

        let mut q = sqlx::query(&query);
        for p in where_result.params.iter() {
            q = bind_param_query(q, p);
        }
        Ok(q.execute(self.pool).await?.rows_affected())
    }
}

pub(crate) fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &FilterValue,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        FilterValue::Text(s) => q.bind(s.clone()),
        FilterValue::Number(n) => q.bind(*n),
        FilterValue::Timestamp(t) => q.bind(*t),
        FilterValue::Id(id) => q.bind(*id),
    }
}
