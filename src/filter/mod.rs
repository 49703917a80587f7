pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod evaluate;
pub mod features;
pub mod error;

pub use types::*;
pub use error::FilterError;
pub use features::QueryFeatures;
pub use filter::Filter;
