pub mod migrate;
pub mod readings;
