use std::io::{BufRead, BufReader};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use super::EngineReader;

/// Which engine stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Output,
    Diagnostic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLine {
    pub stream: Stream,
    pub text: String,
}

/// Read `reader` line by line on its own thread and forward each line to `tx`.
///
/// The thread ends at end of stream, on a read error, or when the receiver is
/// gone. Lines are forwarded in read order; invalid UTF-8 is replaced.
pub fn forward_lines(
    reader: EngineReader,
    stream: Stream,
    tx: Sender<EngineLine>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    let text = text.trim_end_matches(['\n', '\r']).to_string();
                    if tx.send(EngineLine { stream, text }).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(?stream, error = %e, "engine stream read failed");
                    break;
                }
            }
        }
    })
}
