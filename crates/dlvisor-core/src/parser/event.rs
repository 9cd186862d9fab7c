/// Progress reading from one engine line or record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressSample {
    /// Bytes done of a known or estimated total.
    Bytes { done: f64, total: f64 },
    /// Segmented transfer: fragment `index` of `count`.
    Fragments { index: u64, count: u64 },
    /// Engine-computed percentage.
    Percent(f64),
}

impl ProgressSample {
    /// `round(numerator / denominator * 100)`, clamped to 0..=100. `None`
    /// when the denominator is unknown.
    pub fn percent(&self) -> Option<u8> {
        let raw = match *self {
            ProgressSample::Bytes { done, total } => ratio(done, total)?,
            ProgressSample::Fragments { index, count } => ratio(index as f64, count as f64)?,
            ProgressSample::Percent(p) => p,
        };
        if !raw.is_finite() {
            return None;
        }
        Some(raw.round().clamp(0.0, 100.0) as u8)
    }

    pub fn fragments(&self) -> Option<(u64, u64)> {
        match *self {
            ProgressSample::Fragments { index, count } => Some((index, count)),
            _ => None,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator * 100.0)
}

/// Structured event derived from engine output. Lines that yield no event
/// are ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The engine chose a destination file for the next component stream.
    Destination,
    Merging,
    /// The final file already exists.
    AlreadyComplete,
    Progress {
        sample: ProgressSample,
        /// Bytes per second; `None` when the engine does not know yet.
        speed: Option<f64>,
    },
    /// The engine is retrying internally: attempt `attempt` of `limit`.
    RetryNotice { attempt: u32, limit: u32 },
}

/// Parse a speed such as `1.50MiB` (the `/s` already stripped) into bytes.
pub fn parse_speed(value: &str, unit: &str) -> Option<f64> {
    let value: f64 = value.trim().parse().ok()?;
    let multiplier = match unit.trim() {
        "B" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "KB" | "kB" => 1000.0,
        "MB" => 1000.0 * 1000.0,
        "GB" => 1000.0 * 1000.0 * 1000.0,
        _ => return None,
    };
    Some(value * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_and_clamps() {
        assert_eq!(ProgressSample::Percent(42.5).percent(), Some(43));
        assert_eq!(ProgressSample::Percent(120.0).percent(), Some(100));
        assert_eq!(ProgressSample::Percent(-3.0).percent(), Some(0));
        assert_eq!(
            ProgressSample::Bytes { done: 1.0, total: 3.0 }.percent(),
            Some(33)
        );
        assert_eq!(
            ProgressSample::Fragments { index: 40, count: 200 }.percent(),
            Some(20)
        );
    }

    #[test]
    fn unknown_total_has_no_percent() {
        assert_eq!(ProgressSample::Bytes { done: 5.0, total: 0.0 }.percent(), None);
        assert_eq!(ProgressSample::Fragments { index: 1, count: 0 }.percent(), None);
    }

    #[test]
    fn speed_units() {
        assert_eq!(parse_speed("2", "B"), Some(2.0));
        assert_eq!(parse_speed("1.5", "KiB"), Some(1536.0));
        assert_eq!(parse_speed("1", "MiB"), Some(1048576.0));
        assert_eq!(parse_speed("1", "GiB"), Some(1073741824.0));
        assert_eq!(parse_speed("3", "KB"), Some(3000.0));
        assert_eq!(parse_speed("3", "MB"), Some(3_000_000.0));
        assert_eq!(parse_speed("1", "GB"), Some(1e9));
        assert_eq!(parse_speed("1", "TiB"), None);
        assert_eq!(parse_speed("fast", "MiB"), None);
    }
}
