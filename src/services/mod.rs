pub mod audit;
pub mod user_service;
pub mod weather_service;

pub use audit::AuditLogWriter;
pub use user_service::{UserError, UserService};
pub use weather_service::{five_months_before, WeatherError, WeatherPage, WeatherService};
