// Configuration loading

pub mod settings;
pub mod sources;

pub use settings::{ConfigError, FeedSettings, Overrides, RunConfig};
pub use sources::{discover_sources, env_vars, load_dotenv, DEFAULT_PREFIXES};
