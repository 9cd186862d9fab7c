//! CLI command handlers, one file per command family.

mod config;
mod download;
mod generate;

pub use config::run_config;
pub use download::{run_download, Source};
pub use generate::{run_completions, run_man};
