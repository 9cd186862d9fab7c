use std::sync::Arc;

use super::{StatusLine, StatusMessage, StatusSink, Symbol};

/// Owns one job's status line and publishes every change to a sink.
pub struct JobReporter {
    line: usize,
    status: StatusLine,
    sink: Arc<dyn StatusSink>,
}

impl JobReporter {
    pub fn new(line: usize, status: StatusLine, sink: Arc<dyn StatusSink>) -> Self {
        Self { line, status, sink }
    }

    pub fn set(&mut self, symbol: Symbol, body: impl Into<String>) {
        self.status.set(symbol, body);
        self.publish();
    }

    pub fn set_suffix(&mut self, suffix: impl Into<String>) {
        self.status.set_suffix(suffix);
        self.publish();
    }

    pub fn clear_suffix(&mut self) {
        if self.status.suffix().is_some() {
            self.status.clear_suffix();
            self.publish();
        }
    }

    fn publish(&self) {
        self.sink
            .emit(StatusMessage::replace(self.line, self.status.render()));
    }
}
