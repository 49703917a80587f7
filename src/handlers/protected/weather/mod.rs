pub mod readings;
pub mod stats;

pub use readings::{create, create_batch, delete, get, list, replace, update_precipitation};
pub use stats::{max_precipitation, max_temperature, stats};
