pub mod auth;
pub mod error_detail;
pub mod extract;
pub mod response;
pub mod restrict;

pub use auth::{extract_token, protect, CurrentUser, LOGGED_OUT, SESSION_COOKIE};
pub use error_detail::render_error_detail;
pub use extract::{parse_id, ApiJson, ApiQuery};
pub use response::{ApiResponse, ApiResult};
pub use restrict::{gated, restrict_to, RoleGate};
