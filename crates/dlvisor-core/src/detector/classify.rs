//! Recognize failure signatures in engine diagnostics.

use std::fmt;

/// Engine failure that warrants killing and respawning the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ConnectionReset,
    Timeout,
    /// HTTP 403 / Forbidden.
    Forbidden,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureKind::ConnectionReset => "Connection reset",
            FailureKind::Timeout => "Connection timed out",
            FailureKind::Forbidden => "Received HTTP Error 403",
        };
        f.write_str(text)
    }
}

/// Classify one diagnostic line (case-insensitive). `None` for anything that
/// is not a known failure signature.
pub fn classify_failure(line: &str) -> Option<FailureKind> {
    let lower = line.to_ascii_lowercase();
    if lower.contains("http error 403") || lower.contains("forbidden") {
        return Some(FailureKind::Forbidden);
    }
    if lower.contains("connection reset") {
        return Some(FailureKind::ConnectionReset);
    }
    if lower.contains("timed out") {
        return Some(FailureKind::Timeout);
    }
    None
}
