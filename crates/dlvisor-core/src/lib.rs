pub mod config;
pub mod logging;

pub mod detector;
pub mod engine;
pub mod job;
pub mod parser;
pub mod render;
pub mod resolve;
pub mod status;
pub mod supervisor;
pub mod worker;

pub use config::SupervisorConfig;
pub use job::{Job, RunSummary};
pub use render::Screen;
pub use supervisor::Supervisor;
