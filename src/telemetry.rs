//! Application telemetry events and sinks.
//!
//! The bot runs unattended, so each triage decision is emitted as a
//! structured event. Sinks are pluggable: production runs write JSON lines to
//! stderr, tests capture events in memory, and everything can be disabled
//! with the no-op sink.

use std::io;

use serde::{Deserialize, Serialize};

/// A structured telemetry event emitted during a triage run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// A warning comment was posted on an issue.
    IssueWarned {
        /// Issue number that was warned.
        number: u64,
    },
    /// An issue was closed as stale.
    IssueClosed {
        /// Issue number that was closed.
        number: u64,
    },
    /// An issue was skipped and will never be acted on this run.
    IssueSkipped {
        /// Issue number that was skipped.
        number: u64,
        /// Why the issue was skipped.
        reason: String,
    },
    /// A triage run finished.
    RunCompleted {
        /// Issues that received a warning comment.
        warned: u64,
        /// Issues closed as stale.
        closed: u64,
        /// Issues skipped by policy.
        skipped: u64,
        /// Issues left untouched until more time passes.
        waiting: u64,
    },
    /// An error was captured by the reporting wrapper.
    ErrorCaptured {
        /// Name of the entry point that failed.
        context: String,
        /// Stable error kind identifier.
        error_kind: String,
        /// Truncated error message.
        message: String,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Records telemetry events to stderr as JSON lines (JSONL).
///
/// This is intended for log capture by the hosting automation and is not
/// transmitted anywhere.
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}


#[cfg(test)]
mod tests {
    use super::test_sink::RecordingSink;
    use super::{TelemetryEvent, TelemetrySink};

    #[test]
    fn recording_sink_captures_events() {
        let sink = RecordingSink::default();
        sink.record(TelemetryEvent::IssueWarned { number: 12 });

        assert_eq!(
            sink.take(),
            vec![TelemetryEvent::IssueWarned { number: 12 }]
        );
    }

    #[test]
    fn events_serialise_with_type_tag() {
        let serialised = serde_json::to_string(&TelemetryEvent::IssueSkipped {
            number: 3,
            reason: "locked".to_owned(),
        })
        .expect("event should serialise");

        assert!(serialised.contains("\"type\":\"issue_skipped\""));
        assert!(serialised.contains("\"reason\":\"locked\""));
    }
}
