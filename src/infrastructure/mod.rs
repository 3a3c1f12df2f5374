pub mod config;
pub mod container;
pub mod database;
pub mod external_services;
pub mod file_system;
pub mod memory;
pub mod messaging;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError, VectorBackend};
pub use container::AppContainer;
pub use file_system::LocalFileStorage;
