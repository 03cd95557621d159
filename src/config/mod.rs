pub mod loader;
pub mod schema;

pub use loader::{ConfigError, load_config, load_env_file};
pub use schema::{Credentials, SweepConfig, SweepPolicy};
