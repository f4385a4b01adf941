//! Configuration models for the scheduler and its HTTP front end.

pub mod app;

pub use app::{load_dotenv, AppConfig, SchedulerConfig, ServerConfig};
