// handlers/elevated/mod.rs - Teacher-only handlers
//
// Mounted behind `protect` and a teacher role gate on the whole router.

pub mod bulk;
pub mod users;

pub use bulk::{delete_by_last_login, update_roles};
pub use users::{create_user, delete_user, get_user, list_users, update_user};
