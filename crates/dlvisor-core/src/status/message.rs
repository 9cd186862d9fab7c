use std::sync::mpsc;
use std::sync::{Arc, Mutex};

/// Display intent for one line of the status screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    /// `None` appends a new line; `Some(i)` replaces line `i`.
    pub line: Option<usize>,
    pub text: String,
}

impl StatusMessage {
    pub fn append(text: impl Into<String>) -> Self {
        Self {
            line: None,
            text: text.into(),
        }
    }

    pub fn replace(line: usize, text: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            text: text.into(),
        }
    }
}

/// Capability to publish status messages.
///
/// Thread workers publish through an in-memory channel; a process-based
/// worker would implement this over a pipe. The renderer does not care which.
pub trait StatusSink: Send + Sync {
    fn emit(&self, message: StatusMessage);
}

/// Producer side of the bounded status channel. Cloned once per worker.
#[derive(Debug, Clone)]
pub struct StatusSender {
    tx: mpsc::SyncSender<StatusMessage>,
}

/// Consumer side of the status channel; owned by the renderer.
pub type StatusReceiver = mpsc::Receiver<StatusMessage>;

/// Create a bounded status channel. Senders block when `capacity` messages
/// are waiting, so a slow terminal applies back-pressure instead of growing
/// an unbounded queue.
pub fn status_channel(capacity: usize) -> (StatusSender, StatusReceiver) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    (StatusSender { tx }, rx)
}

impl StatusSink for StatusSender {
    fn emit(&self, message: StatusMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!("status channel closed; message discarded");
        }
    }
}

/// Sink that records messages in memory (tests, headless runs).
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<StatusMessage>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<StatusMessage> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl StatusSink for MemorySink {
    fn emit(&self, message: StatusMessage) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_preserves_fifo_order() {
        let (tx, rx) = status_channel(8);
        tx.emit(StatusMessage::append("a"));
        tx.emit(StatusMessage::replace(0, "b"));
        drop(tx);
        let got: Vec<StatusMessage> = rx.iter().collect();
        assert_eq!(
            got,
            vec![StatusMessage::append("a"), StatusMessage::replace(0, "b")]
        );
    }

    #[test]
    fn emit_after_receiver_dropped_does_not_panic() {
        let (tx, rx) = status_channel(1);
        drop(rx);
        tx.emit(StatusMessage::append("late"));
    }

    #[test]
    fn memory_sink_records_messages() {
        let sink = MemorySink::new();
        let clone = sink.clone();
        clone.emit(StatusMessage::replace(2, "x"));
        assert_eq!(sink.messages(), vec![StatusMessage::replace(2, "x")]);
    }
}
