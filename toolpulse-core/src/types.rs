//! Domain types shared by the loader and the analyzer.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, Utc};

/// Outcome of a tool invocation, reconstructed from the log.
///
/// Modeled as an explicit three-variant tag rather than an optional boolean
/// so that "no result observed yet" is a first-class state the analyzer
/// matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// No matching result event has been observed.
    Pending,
    /// A result event arrived and did not signal an error.
    Success,
    /// A result event arrived with `is_error: true`.
    Failure,
}

impl ExecutionOutcome {
    /// Build the outcome from a result event's error flag.
    ///
    /// A result with no explicit flag counts as success; the flag defaults
    /// to `false` during deserialization.
    pub fn from_result_flag(is_error: bool) -> Self {
        if is_error {
            ExecutionOutcome::Failure
        } else {
            ExecutionOutcome::Success
        }
    }

    /// Whether any matching result event has been observed.
    pub fn has_result(&self) -> bool {
        !matches!(self, ExecutionOutcome::Pending)
    }

    /// The result's error flag, or `None` while pending.
    pub fn is_error(&self) -> Option<bool> {
        match self {
            ExecutionOutcome::Pending => None,
            ExecutionOutcome::Success => Some(false),
            ExecutionOutcome::Failure => Some(true),
        }
    }
}

/// A reconstructed tool invocation with its correlated outcome.
///
/// Created by the loader, held in memory for one analysis run, and treated
/// as immutable by the analyzer.
#[derive(Debug, Clone)]
pub struct ToolExecution {
    /// Correlation key supplied by the source log, unique per invocation.
    pub tool_use_id: String,
    /// Time the invocation occurred (UTC).
    pub timestamp: DateTime<Utc>,
    /// Dispatcher name recorded on the invocation (e.g. "Skill", "Task").
    pub tool_name: String,
    /// Invocation parameter map; `skill` / `subagent_type` keys select the
    /// logical identity used for aggregation.
    pub tool_input: serde_json::Value,
    /// Logical project name the event belongs to.
    pub project: String,
    /// Correlated outcome.
    pub outcome: ExecutionOutcome,
}

/// Closed UTC time window, inclusive on both bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    match date.succ_opt() {
        Some(next) => day_start(next) - Duration::microseconds(1),
        None => DateTime::<Utc>::MAX_UTC,
    }
}

impl DateRange {
    /// The current UTC calendar day.
    pub fn today() -> Self {
        let today = Utc::now().date_naive();
        Self {
            start: day_start(today),
            end: day_end(today),
        }
    }

    /// Build a window from optional day bounds.
    ///
    /// Both bounds are day-granular and normalized to full-day boundaries:
    /// a missing start means "unbounded" when an end is given, a missing end
    /// extends the window to the end of the current day, and neither bound
    /// yields the current day.
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        match (start, end) {
            (None, None) => Self::today(),
            (Some(s), None) => Self {
                start: day_start(s),
                end: day_end(Utc::now().date_naive()),
            },
            (None, Some(e)) => Self {
                start: DateTime::<Utc>::MIN_UTC,
                end: day_end(e),
            },
            (Some(s), Some(e)) => Self {
                start: day_start(s),
                end: day_end(e),
            },
        }
    }

    /// Parse an operator-supplied range label.
    ///
    /// Accepted forms: `<n>d` / `<n>w` / `<n>m` (last n days/weeks/months,
    /// ending today) and `YYYYMMDD` (from that day to today). Anything else
    /// falls back to the current day rather than failing.
    ///
    /// Returns the window and a display subtitle ("Today", "Last 2 weeks",
    /// "From 2025-08-01").
    pub fn parse_label(label: &str) -> (Self, String) {
        let label = label.trim();
        let today = Utc::now().date_naive();

        if let Some((value, unit)) = split_unit_label(label) {
            let start = match unit {
                'd' => today - Duration::days(value as i64),
                'w' => today - Duration::weeks(value as i64),
                _ => today.checked_sub_months(Months::new(value)).unwrap_or(today),
            };
            let unit_name = match unit {
                'd' => "day",
                'w' => "week",
                _ => "month",
            };
            let plural = if value == 1 { "" } else { "s" };
            let subtitle = format!("Last {} {}{}", value, unit_name, plural);
            return (Self::from_bounds(Some(start), None), subtitle);
        }

        if let Ok(date) = NaiveDate::parse_from_str(label, "%Y%m%d") {
            let subtitle = format!("From {}", date.format("%Y-%m-%d"));
            return (Self::from_bounds(Some(date), None), subtitle);
        }

        if !label.is_empty() && !label.eq_ignore_ascii_case("today") {
            tracing::debug!(label, "Unrecognized date label, defaulting to today");
        }
        (Self::today(), "Today".to_string())
    }

    /// Whether a timestamp falls inside the window (inclusive bounds).
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// Split a `<digits><d|w|m>` label into its parts.
fn split_unit_label(label: &str) -> Option<(u32, char)> {
    let unit = label.chars().last()?.to_ascii_lowercase();
    if !matches!(unit, 'd' | 'w' | 'm') {
        return None;
    }
    let digits = &label[..label.len() - 1];
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u32>().ok().map(|value| (value, unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_outcome_accessors() {
        assert!(!ExecutionOutcome::Pending.has_result());
        assert_eq!(ExecutionOutcome::Pending.is_error(), None);
        assert_eq!(ExecutionOutcome::Success.is_error(), Some(false));
        assert_eq!(ExecutionOutcome::Failure.is_error(), Some(true));
        assert_eq!(
            ExecutionOutcome::from_result_flag(false),
            ExecutionOutcome::Success
        );
        assert_eq!(
            ExecutionOutcome::from_result_flag(true),
            ExecutionOutcome::Failure
        );
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let day = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        let range = DateRange::from_bounds(Some(day), Some(day));

        assert!(range.contains(range.start));
        assert!(range.contains(range.end));
        assert!(!range.contains(range.start - Duration::microseconds(1)));
        assert!(!range.contains(range.end + Duration::microseconds(1)));
    }

    #[test]
    fn test_window_normalizes_to_day_boundaries() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap();
        let range = DateRange::from_bounds(Some(start), Some(end));

        assert_eq!(range.start, Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap());
        assert!(range.contains(Utc.with_ymd_and_hms(2025, 7, 3, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2025, 7, 4, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_end_only_window_is_unbounded_at_start() {
        let end = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap();
        let range = DateRange::from_bounds(None, Some(end));

        assert!(range.contains(Utc.with_ymd_and_hms(1971, 1, 1, 0, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2025, 7, 4, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_parse_label_units() {
        let (range, subtitle) = DateRange::parse_label("7d");
        assert_eq!(subtitle, "Last 7 days");
        let expected_start = Utc::now().date_naive() - Duration::days(7);
        assert_eq!(range.start, day_start(expected_start));

        let (_, subtitle) = DateRange::parse_label("1w");
        assert_eq!(subtitle, "Last 1 week");

        let (_, subtitle) = DateRange::parse_label("3m");
        assert_eq!(subtitle, "Last 3 months");
    }

    #[test]
    fn test_parse_label_explicit_date() {
        let (range, subtitle) = DateRange::parse_label("20250801");
        assert_eq!(subtitle, "From 2025-08-01");
        let expected = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        assert_eq!(range.start, day_start(expected));
    }

    #[test]
    fn test_parse_label_fallback() {
        let (range, subtitle) = DateRange::parse_label("not-a-label");
        assert_eq!(subtitle, "Today");
        assert_eq!(range, DateRange::today());

        let (_, subtitle) = DateRange::parse_label("");
        assert_eq!(subtitle, "Today");
    }
}
