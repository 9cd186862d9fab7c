//! Line patterns of the engine's human-readable (`--newline`) output.

use regex::Regex;

use super::event::{parse_speed, EngineEvent, ProgressSample};

/// Prefixes of chatter lines that never carry an event.
const SKIP_PREFIXES: &[&str] = &[
    "[info]",
    "[youtube]",
    "[dashsegments]",
    "Deleting original file",
];

/// Compiled once per run and shared by all workers.
#[derive(Debug)]
pub struct TextPatterns {
    destination: Regex,
    merging: Regex,
    already: Regex,
    component: Regex,
    progress: Regex,
    speed: Regex,
    fragment: Regex,
    retry: Regex,
}

impl TextPatterns {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            destination: Regex::new(r"^\[download\] Destination: ")?,
            merging: Regex::new(r"^\[Merger\] Merging formats into")?,
            already: Regex::new(r"^\[download\] (?P<path>.+) has already been downloaded")?,
            // Per-format component files carry a `.f<id>.` marker.
            component: Regex::new(r"\.f\d+(?:-\d+)?\.[A-Za-z0-9]+$")?,
            progress: Regex::new(r"^\[download\]\s+(?P<pc>\d+(?:\.\d+)?)%")?,
            speed: Regex::new(r"\bat\s+(?P<value>\d+(?:\.\d+)?)\s*(?P<unit>[kKMG]?i?B)/s")?,
            fragment: Regex::new(r"\(frag (?P<index>\d+)/(?P<count>\d+)\)")?,
            retry: Regex::new(
                r"Retrying(?: fragment \d+)? \((?:attempt )?(?P<n>\d+)(?: of |/)(?P<m>\d+)\)",
            )?,
        })
    }

    /// Derive the event carried by one output line, if any.
    pub fn parse(&self, line: &str) -> Option<EngineEvent> {
        let line = line.trim();
        if line.is_empty() || is_chatter(line) {
            return None;
        }
        if let Some(caps) = self.retry.captures(line) {
            return Some(EngineEvent::RetryNotice {
                attempt: caps["n"].parse().ok()?,
                limit: caps["m"].parse().ok()?,
            });
        }
        if self.merging.is_match(line) {
            return Some(EngineEvent::Merging);
        }
        if self.destination.is_match(line) {
            return Some(EngineEvent::Destination);
        }
        if let Some(caps) = self.already.captures(line) {
            // A finished component counts as that component's destination.
            return Some(if self.component.is_match(&caps["path"]) {
                EngineEvent::Destination
            } else {
                EngineEvent::AlreadyComplete
            });
        }
        if let Some(caps) = self.progress.captures(line) {
            let percent: f64 = caps["pc"].parse().ok()?;
            let sample = match self.fragment.captures(line) {
                Some(frag) => ProgressSample::Fragments {
                    index: frag["index"].parse().ok()?,
                    count: frag["count"].parse().ok()?,
                },
                None => ProgressSample::Percent(percent),
            };
            let speed = self
                .speed
                .captures(line)
                .and_then(|s| parse_speed(&s["value"], &s["unit"]));
            return Some(EngineEvent::Progress { sample, speed });
        }
        None
    }
}

fn is_chatter(line: &str) -> bool {
    SKIP_PREFIXES.iter().any(|p| line.starts_with(p))
        || line.contains("will be merged into mkv")
}

/// True when a diagnostic announces that the engine is retrying on its own.
pub fn is_engine_retry(line: &str) -> bool {
    line.contains("Retrying")
}
