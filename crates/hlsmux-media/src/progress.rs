//! FFmpeg progress parsing.
//!
//! FFmpeg reports transcode position on its diagnostic stream as stats lines
//! containing a `time=` token. The parser turns those lines into monotonic
//! percent-complete samples against a known total duration.

use serde::{Deserialize, Serialize};

/// Percent values are clamped here until the process exits; the final 100
/// is emitted by the engine on a clean exit, not by the parser.
pub const PERCENT_CEILING: f64 = 99.9;

/// One percent-complete observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    /// Percent complete, in (0, 100]
    pub percent: f64,
    /// Elapsed encoded seconds the percent was derived from
    pub elapsed: f64,
}

/// Stateful, single-job progress parser.
#[derive(Debug)]
pub struct ProgressParser {
    duration: f64,
    last_percent: f64,
}

impl ProgressParser {
    /// Create a parser for a source of `duration` seconds (0 = unknown).
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            last_percent: 0.0,
        }
    }

    /// Consume one diagnostic line.
    ///
    /// Returns a sample only when the line carries a parsable `time=` token,
    /// the total duration is known, and the resulting percent is strictly
    /// greater than the last emitted one. Malformed lines are skipped.
    pub fn feed(&mut self, line: &str) -> Option<ProgressSample> {
        let token = extract_time_token(line)?;
        let elapsed = parse_timestamp(token);
        if elapsed <= 0.0 || self.duration <= 0.0 {
            return None;
        }

        let percent = (elapsed / self.duration * 100.0).min(PERCENT_CEILING);
        if percent <= self.last_percent {
            return None;
        }

        self.last_percent = percent;
        Some(ProgressSample { percent, elapsed })
    }

    /// The highest percent emitted so far.
    pub fn last_percent(&self) -> f64 {
        self.last_percent
    }
}

/// Locate the value of the first `time=` token in a stats line.
fn extract_time_token(line: &str) -> Option<&str> {
    let rest = &line[line.find("time=")? + "time=".len()..];
    rest.split_whitespace().next().filter(|t| !t.is_empty())
}

/// Parse an FFmpeg time value into seconds.
///
/// Accepts `HH:MM:SS[.fraction]`, `MM:SS` and bare seconds. Unparsable
/// input falls back to 0 rather than raising.
pub fn parse_timestamp(s: &str) -> f64 {
    let parts: Vec<&str> = s.split(':').collect();
    let parsed = match parts.as_slice() {
        [h, m, sec] => (|| {
            let h: f64 = h.parse().ok()?;
            let m: f64 = m.parse().ok()?;
            let sec: f64 = sec.parse().ok()?;
            Some(h * 3600.0 + m * 60.0 + sec)
        })(),
        [m, sec] => (|| {
            let m: f64 = m.parse().ok()?;
            let sec: f64 = sec.parse().ok()?;
            Some(m * 60.0 + sec)
        })(),
        [sec] => sec.parse().ok(),
        _ => None,
    };
    parsed.unwrap_or(0.0)
}
