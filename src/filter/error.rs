use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid query parameter: {0}")]
    InvalidKey(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Projection cannot mix inclusion and exclusion")]
    MixedProjection,
}
