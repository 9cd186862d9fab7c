//! Status messages: the only unit of communication between workers and the renderer.
//!
//! Workers describe what a line should show (`StatusLine`), wrap it into a
//! `StatusMessage` addressed by line index, and hand it to a `StatusSink`.

mod line;
mod message;
mod reporter;

pub use line::{StatusLine, Symbol};
pub use message::{
    status_channel, MemorySink, StatusMessage, StatusReceiver, StatusSender, StatusSink,
};
pub use reporter::JobReporter;
