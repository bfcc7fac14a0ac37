//! Inclusive lookback window applied to every record.

use chrono::{DateTime, SecondsFormat, Utc};

/// Unix seconds of `2025-01-01T00:00:00Z`, the default window start.
pub const DEFAULT_WINDOW_START_SECS: i64 = 1_735_689_600;

/// Returns the default window start, `2025-01-01T00:00:00Z`.
#[must_use]
pub fn default_window_start() -> DateTime<Utc> {
    DateTime::from_timestamp(DEFAULT_WINDOW_START_SECS, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Closed interval `[start, end]` of accepted record timestamps.
///
/// # Example
///
/// ```
/// use chrono::{DateTime, Utc};
/// use tally::contributions::DateWindow;
///
/// let start: DateTime<Utc> = "2025-01-01T00:00:00Z".parse().expect("valid timestamp");
/// let end: DateTime<Utc> = "2025-06-30T00:00:00Z".parse().expect("valid timestamp");
/// let window = DateWindow::new(start, end);
///
/// assert!(window.contains(start));
/// assert!(window.contains(end));
/// assert_eq!(window.since_parameter(), "2025-01-01T00:00:00Z");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateWindow {
    /// Creates a window. A start after the end yields an empty window.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// First accepted instant.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Last accepted instant, normally the run's `now`.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns true when `instant` lies within both bounds.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Start formatted for GitHub's `since` query parameter.
    #[must_use]
    pub fn since_parameter(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}
