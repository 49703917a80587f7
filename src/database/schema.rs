// database/schema.rs - Field catalogue for the queryable collections
//
// Maps the document field names clients use (`deviceName`, `_id`) onto
// table columns, and tells the filter layer how to coerce query values.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::filter::FilterValue;
use crate::types::parse_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Id,
    Text,
    Number,
    Integer,
    Timestamp,
}

impl FieldKind {
    /// Coerce a raw query-string value into a typed filter value
    pub fn coerce(&self, raw: &str) -> Option<FilterValue> {
        match self {
            FieldKind::Id => raw.trim().parse::<Uuid>().ok().map(FilterValue::Id),
            FieldKind::Text => Some(FilterValue::Text(raw.to_string())),
            FieldKind::Number | FieldKind::Integer => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(FilterValue::Number),
            FieldKind::Timestamp => parse_timestamp(raw).map(FilterValue::Timestamp),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// Name as it appears in JSON documents and query strings
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, column: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef { name, column, kind }
}

#[derive(Debug)]
pub struct Collection {
    pub table: &'static str,
    pub fields: &'static [FieldDef],
    /// Left out of documents unless a projection names them
    pub hidden: &'static [&'static str],
    pub default_sort: &'static str,
}

impl Collection {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        self.hidden.contains(&name)
    }
}

pub const ID_FIELD: &str = "_id";

pub static WEATHER: Collection = Collection {
    table: "weather",
    fields: &[
        field("_id", "id", FieldKind::Id),
        field("deviceName", "device_name", FieldKind::Text),
        field("time", "time", FieldKind::Timestamp),
        field("temperature", "temperature", FieldKind::Number),
        field("humidity", "humidity", FieldKind::Number),
        field("latitude", "latitude", FieldKind::Number),
        field("longitude", "longitude", FieldKind::Number),
        field("windDirection", "wind_direction", FieldKind::Number),
        field("atmosphericPressure", "atmospheric_pressure", FieldKind::Number),
        field("solarRadiation", "solar_radiation", FieldKind::Number),
        field("maxWindSpeed", "max_wind_speed", FieldKind::Number),
        field("vaporPressure", "vapor_pressure", FieldKind::Number),
        field("precipitation", "precipitation", FieldKind::Number),
        field("createdAt", "created_at", FieldKind::Timestamp),
        field("__v", "version", FieldKind::Integer),
    ],
    hidden: &["__v"],
    default_sort: "-createdAt",
};

// No password_hash entry: it can never be selected or filtered on.
pub static USERS: Collection = Collection {
    table: "users",
    fields: &[
        field("_id", "id", FieldKind::Id),
        field("name", "name", FieldKind::Text),
        field("email", "email", FieldKind::Text),
        field("role", "role", FieldKind::Text),
        field("passwordChangedAt", "password_changed_at", FieldKind::Timestamp),
        field("lastLoggedIn", "last_logged_in", FieldKind::Timestamp),
        field("createdAt", "created_at", FieldKind::Timestamp),
        field("updatedAt", "updated_at", FieldKind::Timestamp),
    ],
    hidden: &[],
    default_sort: "-createdAt",
};

/// Timestamp helper shared by the executors: documents carry RFC 3339 strings
pub fn document_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_timestamp)
}
