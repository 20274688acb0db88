pub mod commands;
pub mod config;

pub use commands::{parse_filter, watch_leads, Kind, ListArgs, Workspace};
pub use config::CliConfig;
