pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use handlers::{register_routes, TriggerConfig};
pub use models::{InvalidFieldError, NotificationEvent, RelayOutcome, DEFAULT_TITLE};
pub use services::NotificationRelay;
