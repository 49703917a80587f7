// filter/features.rs - Query-string driven read queries
//
// Turns `?temperature[gte]=20&sort=-time&fields=deviceName&page=2&limit=10`
// into a Filter. Stages always run filter -> sort -> fields -> paginate.

use crate::config::FilterConfig;
use crate::database::schema::{Collection, ID_FIELD};

use super::error::FilterError;
use super::filter::Filter;
use super::filter_order::FilterOrder;
use super::types::{FilterOp, FilterValue, Projection};

const RESERVED_KEYS: [&str; 4] = ["page", "sort", "limit", "fields"];
const DEFAULT_LIMIT: u64 = 100;

pub struct QueryFeatures<'a> {
    params: &'a [(String, String)],
    filter: Filter,
    default_limit: u64,
    max_limit: Option<u64>,
}

impl<'a> QueryFeatures<'a> {
    pub fn new(collection: &'static Collection, params: &'a [(String, String)]) -> Self {
        Self {
            params,
            filter: Filter::new(collection),
            default_limit: DEFAULT_LIMIT,
            max_limit: None,
        }
    }

    pub fn limits(mut self, config: &FilterConfig) -> Self {
        self.default_limit = config.default_limit.max(1);
        self.max_limit = config.max_limit;
        self
    }

    /// Run every stage in order
    pub fn apply(
        collection: &'static Collection,
        params: &'a [(String, String)],
        config: &FilterConfig,
    ) -> Result<Filter, FilterError> {
        Ok(Self::new(collection, params)
            .limits(config)
            .filter()?
            .sort()
            .limit_fields()?
            .paginate()
            .build())
    }

    pub fn filter(mut self) -> Result<Self, FilterError> {
        let collection = self.filter.collection();
        for (key, raw) in self.params {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let (field, operator) = parse_key(key)?;

            let value = match collection.field(field) {
                Some(def) => def.kind.coerce(raw).ok_or_else(|| FilterError::InvalidValue {
                    field: field.to_string(),
                    value: raw.clone(),
                })?,
                None => FilterValue::Text(raw.clone()),
            };
            self.filter = self.filter.where_op(field, operator, value);
        }
        Ok(self)
    }

    pub fn sort(mut self) -> Self {
        let spec = self.param("sort").unwrap_or(self.filter.collection().default_sort);
        let mut order = FilterOrder::parse(spec);
        if order.is_empty() {
            order = FilterOrder::parse(self.filter.collection().default_sort);
        }
        self.filter.set_order(order);
        self
    }

    pub fn limit_fields(mut self) -> Result<Self, FilterError> {
        let Some(spec) = self.param("fields") else {
            return Ok(self);
        };

        let mut include = Vec::new();
        let mut exclude = Vec::new();
        let mut id = true;
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.strip_prefix('-') {
                Some(ID_FIELD) => id = false,
                Some(field) => exclude.push(field.to_string()),
                None if part == ID_FIELD => id = true,
                None => include.push(part.to_string()),
            }
        }

        let projection = match (include.is_empty(), exclude.is_empty()) {
            (false, false) => return Err(FilterError::MixedProjection),
            (false, true) => Projection::Include { fields: include, id },
            (true, false) => {
                if !id {
                    exclude.push(ID_FIELD.to_string());
                }
                Projection::Exclude(exclude)
            }
            (true, true) if !id => Projection::Exclude(vec![ID_FIELD.to_string()]),
            // `fields=_id` alone
            (true, true) if spec.split(',').any(|p| p.trim() == ID_FIELD) => {
                Projection::Include { fields: vec![], id: true }
            }
            (true, true) => Projection::All,
        };
        self.filter = self.filter.select(projection);
        Ok(self)
    }

    pub fn paginate(mut self) -> Self {
        let page_param = self.param("page").filter(|p| !p.trim().is_empty());
        let page = page_param.and_then(positive).unwrap_or(1);
        let mut limit = self.param("limit").and_then(positive).unwrap_or(self.default_limit);

        if let Some(max) = self.max_limit {
            if limit > max {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max);
                limit = max;
            }
        }

        let skip = (page - 1).saturating_mul(limit);
        self.filter = self.filter.limit(limit, skip);
        if page_param.is_some() {
            self.filter.mark_page_requested();
        }
        self
    }

    pub fn build(self) -> Filter {
        self.filter
    }

    /// Last value for a reserved key
    fn param(&self, key: &str) -> Option<&'a str> {
        self.params.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

fn positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

/// `temperature` -> (temperature, Eq); `temperature[gte]` -> (temperature, Gte)
fn parse_key(key: &str) -> Result<(&str, FilterOp), FilterError> {
    let Some(open) = key.find('[') else {
        if key.contains(']') || key.is_empty() {
            return Err(FilterError::InvalidKey(key.to_string()));
        }
        return Ok((key, FilterOp::Eq));
    };

    let field = &key[..open];
    let op = key[open + 1..]
        .strip_suffix(']')
        .filter(|_| !field.is_empty())
        .ok_or_else(|| FilterError::InvalidKey(key.to_string()))?;

    let operator = FilterOp::from_bracket(op).ok_or_else(|| FilterError::UnsupportedOperator(op.to_string()))?;
    Ok((field, operator))
}
