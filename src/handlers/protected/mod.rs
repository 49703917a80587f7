// handlers/protected/mod.rs - Protected handlers (session required)
//
// Every route here sits behind `protect`, which attaches the caller as
// `CurrentUser`. Role gates are declared per route in `app.rs`.

pub mod account;
pub mod weather;

pub use account::{update_me, update_my_password};
