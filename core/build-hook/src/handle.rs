//! Event loop for host build lifecycle notifications.
//!
//! Reads one JSON object per line from stdin and forwards it to a
//! [`BuildRecorder`].
//!
//! ## Events
//!
//! ```text
//! {"event":"build_begin"}                    → timer starts (restarts if running)
//! {"event":"build_done","succeeded":true,…}  → timer stops, seconds added to today
//! {"event":"build_cancel"}                   → timer stops, seconds added to today
//! {"event":"active_configuration_changed"}   → ignored
//! ```
//!
//! Unknown event names and malformed lines are logged and skipped. A failed
//! write does not stop the loop; the recorder keeps the seconds pending and
//! they are flushed once more when stdin closes.

use build_clock::{BuildEventSink, BuildRecorder, DailyCounterStore, StorageConfig};
use serde::Deserialize;
use std::io::{self, BufRead};
use tracing::{debug, error, info, warn};

use crate::error::HookError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    BuildBegin,
    BuildDone {
        #[serde(default)]
        succeeded: bool,
        #[serde(default)]
        modified: bool,
        #[serde(default)]
        cancelled: bool,
    },
    BuildCancel,
    ActiveConfigurationChanged,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub handled: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn run(config: StorageConfig) -> Result<(), HookError> {
    config.ensure_root()?;
    info!(root = %config.root().display(), "Watching for build events");

    let mut recorder = BuildRecorder::new(DailyCounterStore::new(config));
    let streamed = process_events(io::stdin().lock(), &mut recorder);
    match &streamed {
        Ok(summary) => info!(
            handled = summary.handled,
            skipped = summary.skipped,
            failed = summary.failed,
            "Event stream closed"
        ),
        Err(err) => error!(error = %err, "Event stream aborted"),
    }

    if recorder.timer().is_running() {
        warn!("Input closed while a build was running; that build was not recorded");
    }

    // Pending time is flushed however the stream ended.
    if let Err(source) = recorder.flush_pending() {
        let seconds = recorder.pending().values().sum();
        return Err(HookError::Unflushed { seconds, source });
    }

    streamed.map(|_| ())
}

/// Feeds every event line to `sink`.
///
/// Lines are decoded lossily, so bytes that are not UTF-8 end up as a
/// malformed event and are skipped like any other bad line. Only a failing
/// reader ends the stream early.
pub fn process_events<R: BufRead, S: BuildEventSink>(
    mut reader: R,
    sink: &mut S,
) -> Result<StreamSummary, HookError> {
    let mut summary = StreamSummary::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(HookError::ReadInput)?;
        if read == 0 {
            break;
        }

        let text = String::from_utf8_lossy(&buf);
        let line = text.trim();
        if line.is_empty() {
            continue;
        }

        let event: HostEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, line, "Skipping malformed event");
                summary.skipped += 1;
                continue;
            }
        };

        if event == HostEvent::Unknown {
            debug!(line, "Unhandled event");
            summary.skipped += 1;
            continue;
        }

        match dispatch(sink, event) {
            Ok(_) => summary.handled += 1,
            Err(err) => {
                error!(error = %err, event = ?event, "Failed to record build time");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

pub fn dispatch<S: BuildEventSink>(
    sink: &mut S,
    event: HostEvent,
) -> build_clock::Result<Option<u64>> {
    match event {
        HostEvent::BuildBegin => {
            sink.on_build_begin();
            Ok(None)
        }
        HostEvent::BuildDone {
            succeeded,
            modified,
            cancelled,
        } => sink.on_build_done(succeeded, modified, cancelled),
        HostEvent::BuildCancel => sink.on_build_cancel(),
        HostEvent::ActiveConfigurationChanged => {
            sink.on_active_configuration_changed();
            Ok(None)
        }
        HostEvent::Unknown => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use build_clock::{BuildClockError, ManualClock};
    use chrono::NaiveDate;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<String>,
        fail_terminal: bool,
    }

    impl RecordingSink {
        fn terminal(&mut self, name: String) -> build_clock::Result<Option<u64>> {
            self.calls.push(name);
            if self.fail_terminal {
                Err(BuildClockError::RootMissing(PathBuf::from("/missing")))
            } else {
                Ok(Some(1))
            }
        }
    }

    impl BuildEventSink for RecordingSink {
        fn on_build_begin(&mut self) {
            self.calls.push("begin".to_string());
        }

        fn on_build_done(
            &mut self,
            succeeded: bool,
            modified: bool,
            cancelled: bool,
        ) -> build_clock::Result<Option<u64>> {
            self.terminal(format!("done({},{},{})", succeeded, modified, cancelled))
        }

        fn on_build_cancel(&mut self) -> build_clock::Result<Option<u64>> {
            self.terminal("cancel".to_string())
        }

        fn on_active_configuration_changed(&mut self) {
            self.calls.push("config".to_string());
        }
    }

    #[test]
    fn test_parse_build_done_with_flags() {
        let event: HostEvent = serde_json::from_str(
            r#"{"event":"build_done","succeeded":true,"modified":false,"cancelled":true}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            HostEvent::BuildDone {
                succeeded: true,
                modified: false,
                cancelled: true
            }
        );
    }

    #[test]
    fn test_parse_build_done_defaults_flags() {
        let event: HostEvent = serde_json::from_str(r#"{"event":"build_done"}"#).unwrap();
        assert_eq!(
            event,
            HostEvent::BuildDone {
                succeeded: false,
                modified: false,
                cancelled: false
            }
        );
    }

    #[test]
    fn test_parse_unknown_event() {
        let event: HostEvent = serde_json::from_str(r#"{"event":"solution_opened"}"#).unwrap();
        assert_eq!(event, HostEvent::Unknown);
    }

    #[test]
    fn test_parse_missing_tag_fails() {
        assert!(serde_json::from_str::<HostEvent>(r#"{"succeeded":true}"#).is_err());
    }

    #[test]
    fn test_process_events_dispatches_in_order() {
        let input = concat!(
            "{\"event\":\"build_begin\"}\n",
            "\n",
            "{\"event\":\"active_configuration_changed\"}\n",
            "{\"event\":\"build_done\",\"succeeded\":true,\"modified\":true}\n",
            "{\"event\":\"build_cancel\"}\n",
        );
        let mut sink = RecordingSink::default();

        let summary = process_events(Cursor::new(input), &mut sink).unwrap();

        assert_eq!(
            sink.calls,
            vec!["begin", "config", "done(true,true,false)", "cancel"]
        );
        assert_eq!(
            summary,
            StreamSummary {
                handled: 4,
                skipped: 0,
                failed: 0
            }
        );
    }

    #[test]
    fn test_process_events_skips_bad_lines() {
        let input = "not json\n{\"event\":\"mystery\"}\n{\"event\":\"build_begin\"}\n";
        let mut sink = RecordingSink::default();

        let summary = process_events(Cursor::new(input), &mut sink).unwrap();

        assert_eq!(sink.calls, vec!["begin"]);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.handled, 1);
    }

    #[test]
    fn test_process_events_continues_after_write_failure() {
        let input = "{\"event\":\"build_cancel\"}\n{\"event\":\"build_begin\"}\n";
        let mut sink = RecordingSink {
            fail_terminal: true,
            ..Default::default()
        };

        let summary = process_events(Cursor::new(input), &mut sink).unwrap();

        assert_eq!(sink.calls, vec!["cancel", "begin"]);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.handled, 1);
    }

    #[test]
    fn test_process_events_skips_invalid_utf8_line() {
        let input: &[u8] = b"{\"event\":\"build_begin\"}\n\xff\xfe garbage\n{\"event\":\"build_cancel\"}\n";
        let mut sink = RecordingSink::default();

        let summary = process_events(Cursor::new(input), &mut sink).unwrap();

        assert_eq!(sink.calls, vec!["begin", "cancel"]);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.handled, 2);
    }

    #[test]
    fn test_invalid_utf8_between_begin_and_done_keeps_build() {
        let temp = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let store = DailyCounterStore::new(StorageConfig::with_root(temp.path().to_path_buf()));
        let clock = ManualClock::new(today);
        let mut recorder = BuildRecorder::with_clock(store, clock.clone());

        let first: &[u8] = b"{\"event\":\"build_begin\"}\n\xff\xfe garbage\n";
        let summary = process_events(Cursor::new(first), &mut recorder).unwrap();
        assert_eq!(summary.skipped, 1);
        assert!(recorder.timer().is_running());

        clock.advance(Duration::from_secs(5));
        let second: &[u8] = b"\xff\n{\"event\":\"build_done\",\"succeeded\":true}\n";
        let summary = process_events(Cursor::new(second), &mut recorder).unwrap();
        assert_eq!(summary.handled, 1);

        assert_eq!(recorder.store().load(today).unwrap(), 5);
    }

    #[test]
    fn test_final_line_without_newline_is_handled() {
        let mut sink = RecordingSink::default();
        process_events(Cursor::new("{\"event\":\"build_begin\"}"), &mut sink).unwrap();
        assert_eq!(sink.calls, vec!["begin"]);
    }

    #[test]
    fn test_dispatch_drives_recorder() {
        let temp = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let store = DailyCounterStore::new(StorageConfig::with_root(temp.path().to_path_buf()));
        let clock = ManualClock::new(today);
        let mut recorder = BuildRecorder::with_clock(store, clock.clone());

        assert_eq!(dispatch(&mut recorder, HostEvent::BuildBegin).unwrap(), None);
        clock.advance(Duration::from_secs(12));
        let done = HostEvent::BuildDone {
            succeeded: true,
            modified: true,
            cancelled: false,
        };
        assert_eq!(dispatch(&mut recorder, done).unwrap(), Some(12));
        assert_eq!(dispatch(&mut recorder, HostEvent::BuildCancel).unwrap(), None);
        assert_eq!(recorder.store().load(today).unwrap(), 12);
    }
}
