use std::sync::Arc;
use std::time::Instant;

use super::*;
use crate::detector::FailureKind;
use crate::status::{MemorySink, StatusLine};

fn patterns() -> TextPatterns {
    TextPatterns::new().unwrap()
}

fn parser() -> (OutputParser, MemorySink) {
    let sink = MemorySink::new();
    let reporter = JobReporter::new(1, StatusLine::new("vid", 3), Arc::new(sink.clone()));
    let parser = OutputParser::new(Arc::new(patterns()), reporter, Instant::now());
    (parser, sink)
}

fn out(text: &str) -> EngineLine {
    EngineLine {
        stream: Stream::Output,
        text: text.to_string(),
    }
}

fn err(text: &str) -> EngineLine {
    EngineLine {
        stream: Stream::Diagnostic,
        text: text.to_string(),
    }
}

fn texts(sink: &MemorySink) -> Vec<String> {
    sink.messages().into_iter().map(|m| m.text).collect()
}

#[test]
fn parses_stage_lines() {
    let p = patterns();
    assert_eq!(
        p.parse("[download] Destination: Uploader/Title.f136.mp4"),
        Some(EngineEvent::Destination)
    );
    assert_eq!(
        p.parse("[Merger] Merging formats into \"Uploader/Title.mkv\""),
        Some(EngineEvent::Merging)
    );
    assert_eq!(
        p.parse("[download] Uploader/Title.mkv has already been downloaded"),
        Some(EngineEvent::AlreadyComplete)
    );
    assert_eq!(
        p.parse("[download] Uploader/Title.f136.mp4 has already been downloaded"),
        Some(EngineEvent::Destination)
    );
}

#[test]
fn parses_progress_with_speed() {
    let p = patterns();
    let event = p.parse("[download]  42.0% of ~ 10.00MiB at  1.50MiB/s ETA 00:03");
    assert_eq!(
        event,
        Some(EngineEvent::Progress {
            sample: ProgressSample::Percent(42.0),
            speed: Some(1.5 * 1024.0 * 1024.0),
        })
    );
}

#[test]
fn parses_fragment_progress_and_unknown_speed() {
    let p = patterns();
    let event = p.parse("[download]   2.5% of ~ 1.23GiB at  Unknown B/s ETA Unknown (frag 5/200)");
    assert_eq!(
        event,
        Some(EngineEvent::Progress {
            sample: ProgressSample::Fragments { index: 5, count: 200 },
            speed: None,
        })
    );
}

#[test]
fn parses_retry_notices() {
    let p = patterns();
    assert_eq!(
        p.parse("[download] Got error: HTTP Error 503. Retrying (attempt 2 of 10)..."),
        Some(EngineEvent::RetryNotice { attempt: 2, limit: 10 })
    );
    assert_eq!(
        p.parse("WARNING: [download] Got error: timed out. Retrying fragment 7 (3/10)..."),
        Some(EngineEvent::RetryNotice { attempt: 3, limit: 10 })
    );
}

#[test]
fn ignores_chatter_and_unknown_lines() {
    let p = patterns();
    assert_eq!(p.parse("[youtube] dQw4w9WgXcQ: Downloading webpage"), None);
    assert_eq!(p.parse("[info] dQw4w9WgXcQ: Downloading 1 format(s): 136+140"), None);
    assert_eq!(p.parse("[dashsegments] Total fragments: 200"), None);
    assert_eq!(p.parse("Deleting original file Title.f136.mp4"), None);
    assert_eq!(
        p.parse("WARNING: Requested formats are incompatible for merge and will be merged into mkv"),
        None
    );
    assert_eq!(p.parse("something entirely different"), None);
    assert_eq!(p.parse(""), None);
}

#[test]
fn two_destinations_walk_primary_then_secondary() {
    let (mut parser, sink) = parser();
    parser.feed_line(&out("[download] Destination: a.f136.mp4"));
    assert_eq!(parser.state().stage(), Stage::Primary);
    parser.feed_line(&out("[download]  50.0% of 10.00MiB at 2.00MiB/s ETA 00:02"));
    parser.feed_line(&out("[download] Destination: a.f140.m4a"));
    assert_eq!(parser.state().stage(), Stage::Secondary);
    assert_eq!(parser.state().progress_percent(), 0);
    parser.feed_line(&out("[Merger] Merging formats into \"a.mkv\""));
    assert_eq!(parser.state().stage(), Stage::Merging);
    let texts = texts(&sink);
    assert!(texts[0].contains("Downloading video"));
    assert!(texts[1].contains("Video download reached 40%"));
    assert!(texts[2].contains("Downloading audio"));
    assert!(texts[3].contains("Merging data"));
}

#[test]
fn milestones_are_announced_once_per_stage() {
    let (mut parser, sink) = parser();
    parser.feed_line(&out("[download] Destination: a.mp4"));
    for pc in ["5.0", "19.9", "21.0", "25.0", "39.0", "41.0", "99.9", "100"] {
        parser.feed_line(&out(&format!("[download]  {pc}% of 1.00MiB at 2.00MiB/s")));
    }
    let announced: Vec<String> = texts(&sink)
        .into_iter()
        .filter(|t| t.contains("reached"))
        .collect();
    // 19.9 rounds to 20; 99.9 rounds to 100.
    assert_eq!(announced.len(), 3);
    assert!(announced[0].contains("reached 20%"));
    assert!(announced[1].contains("reached 40%"));
    assert!(announced[2].contains("reached 100%"));
}

#[test]
fn fragmented_progress_reports_position_and_dash_suffix_once() {
    let (mut parser, sink) = parser();
    parser.apply(EngineEvent::Destination);
    parser.apply(EngineEvent::Progress {
        sample: ProgressSample::Fragments { index: 40, count: 200 },
        speed: None,
    });
    parser.apply(EngineEvent::Progress {
        sample: ProgressSample::Fragments { index: 60, count: 200 },
        speed: None,
    });
    parser.apply(EngineEvent::Progress {
        sample: ProgressSample::Fragments { index: 80, count: 200 },
        speed: None,
    });
    let all = texts(&sink);
    let reached: Vec<&String> = all.iter().filter(|t| t.contains("reached")).collect();
    assert_eq!(reached.len(), 2);
    assert!(reached[0].contains("reached 20% (frag 40 / 200"));
    assert!(reached[1].contains("reached 40% (frag 80 / 200"));
    assert_eq!(all.iter().filter(|t| t.contains("[!] DASH video")).count(), all.len() - 1);
}

#[test]
fn speed_samples_become_observations() {
    let (mut parser, _sink) = parser();
    parser.feed_line(&out("[download]  10.0% of 10.00MiB at 500.00KiB/s ETA 00:20"));
    parser.feed_line(&out("[download]  11.0% of ~ 10.00MiB at 1.0KiB/s ETA 00:20 (frag 3/40)"));
    assert_eq!(
        parser.take_observations(),
        vec![
            Observation::Speed {
                bytes_per_sec: 500.0 * 1024.0,
                fragmented: false
            },
            Observation::Speed {
                bytes_per_sec: 1024.0,
                fragmented: true
            },
        ]
    );
    assert!(parser.take_observations().is_empty());
}

#[test]
fn diagnostic_failures_are_forwarded_not_retries() {
    let (mut parser, _sink) = parser();
    parser.feed_line(&err("WARNING: [download] Got error: The read operation timed out. Retrying (1/10)..."));
    assert!(parser.take_observations().is_empty());
    parser.feed_line(&err("ERROR: unable to download video data: HTTP Error 403: Forbidden"));
    assert_eq!(
        parser.take_observations(),
        vec![Observation::Failure(FailureKind::Forbidden)]
    );
}

#[test]
fn retry_notice_sets_suffix() {
    let (mut parser, sink) = parser();
    parser.feed_line(&out("[download] Got error: HTTP Error 503. Retrying (attempt 4 of 99)..."));
    let last = sink.messages().pop().unwrap();
    assert!(last.text.contains("[!] Retry  4 / 99"));
    parser.feed_line(&out("[download] Got error: HTTP Error 503. Retrying (attempt 12 of 99)..."));
    let last = sink.messages().pop().unwrap();
    assert!(last.text.contains("[!] Retry 12 / 99"));
}

#[test]
fn info_lines_change_nothing() {
    let (mut parser, sink) = parser();
    parser.feed_line(&out("[info] dQw4w9WgXcQ: Downloading 1 format(s): 136+140"));
    assert!(sink.messages().is_empty());
    assert!(parser.take_observations().is_empty());
    assert_eq!(parser.state().stage(), Stage::Pending);
}

#[test]
fn already_complete_marks_done() {
    let (mut parser, _sink) = parser();
    parser.feed_line(&out("[download] Up/Title.mkv has already been downloaded"));
    assert_eq!(parser.state().stage(), Stage::Done);
    assert!(parser.state().already_complete());
}

#[test]
fn respawn_keeps_stage_and_reannounces() {
    let (mut parser, sink) = parser();
    parser.feed_line(&out("[download] Destination: a.f136.mp4"));
    parser.feed_line(&out("[download] Destination: a.f140.m4a"));
    parser.feed_line(&out("[download]  60.0% of 3.00MiB at 2.00MiB/s"));
    parser.state_mut().begin_restart();
    parser.begin_attempt();
    parser.feed_line(&out("[download] a.f136.mp4 has already been downloaded"));
    assert_eq!(parser.state().stage(), Stage::Secondary);
    parser.feed_line(&out("[download] Destination: a.f140.m4a"));
    assert_eq!(parser.state().stage(), Stage::Secondary);
    parser.feed_line(&out("[download]  20.0% of 3.00MiB at 2.00MiB/s"));
    let last = sink.messages().pop().unwrap();
    assert!(last.text.contains("Audio download reached 20%"));
}

#[test]
fn structured_records_drive_the_same_events() {
    let (mut parser, sink) = parser();
    parser.feed_line(&out("[download] Destination: a.f136.mp4"));
    parser.feed_line(&out(
        r#"dlvisor-progress {"status":"downloading","downloaded_bytes":450,"total_bytes":1000,"speed":2048.0}"#,
    ));
    parser.feed_line(&out(r#"dlvisor-progress {not json"#));
    assert_eq!(parser.state().progress_percent(), 45);
    assert!(texts(&sink).iter().any(|t| t.contains("Video download reached 40%")));
    assert_eq!(
        parser.take_observations(),
        vec![Observation::Speed {
            bytes_per_sec: 2048.0,
            fragmented: false
        }]
    );
}

#[test]
fn structured_record_conversion() {
    let record = ProgressRecord::parse(
        r#"{"status":"downloading","downloaded_bytes":10,"total_bytes":null,"total_bytes_estimate":40.0,"speed":null,"eta":3}"#,
    )
    .unwrap();
    assert_eq!(
        record.to_event(),
        Some(EngineEvent::Progress {
            sample: ProgressSample::Bytes { done: 10.0, total: 40.0 },
            speed: None,
        })
    );
    let frag = ProgressRecord {
        fragment_index: Some(3),
        fragment_count: Some(12),
        ..ProgressRecord::default()
    };
    assert_eq!(
        frag.to_event(),
        Some(EngineEvent::Progress {
            sample: ProgressSample::Fragments { index: 3, count: 12 },
            speed: None,
        })
    );
    let unknown = ProgressRecord {
        downloaded_bytes: Some(5.0),
        ..ProgressRecord::default()
    };
    assert_eq!(unknown.to_event(), None);
    let failed = ProgressRecord {
        status: Some("error".to_string()),
        ..frag
    };
    assert_eq!(failed.to_event(), None);
}
