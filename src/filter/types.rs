use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$ne")] Ne,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,
}

impl FilterOp {
    /// Operators accepted inside `field[op]` query keys
    pub fn from_bracket(op: &str) -> Option<Self> {
        match op {
            "gte" => Some(FilterOp::Gte),
            "gt" => Some(FilterOp::Gt),
            "lte" => Some(FilterOp::Lte),
            "lt" => Some(FilterOp::Lt),
            _ => None,
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "<>",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
        }
    }
}

/// Typed operand; binds to the matching Postgres type
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Timestamp(DateTime<Utc>),
    Id(Uuid),
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub field: String,
    pub operator: FilterOp,
    pub value: FilterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub field: String,
    pub sort: SortDirection,
}

/// Which document fields a read returns
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Projection {
    /// Every field except the collection's hidden ones
    #[default]
    All,
    Include { fields: Vec<String>, id: bool },
    Exclude(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FilterValue>,
}
