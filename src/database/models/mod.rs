pub mod log;
pub mod user;
pub mod weather;

pub use log::{AuditKind, AuditLogEntry};
pub use user::{NewUserInput, PasswordChange, ProfileUpdate, User, UserPatch};
pub use weather::{SensorMaxTemperature, WeatherInput, WeatherReading};
