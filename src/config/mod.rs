mod cli;
mod redacted;
mod relay_config;

pub use cli::Cli;
pub use redacted::Redacted;
pub use relay_config::RelayConfig;
