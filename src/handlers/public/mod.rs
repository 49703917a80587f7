// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Session acquisition plus the housekeeping endpoints. Nothing here reads
// credentials; login and signup are where they come from.

pub mod auth;
pub mod system;

pub use auth::{login, logout, signup};
pub use system::{health, not_found, root};
