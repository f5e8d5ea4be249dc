//! History query construction
//!
//! Turns untrusted request strings into an immutable [`HistoryQuery`]. The
//! station scope comes from the resolved station, never from the request.

use chrono::offset::LocalResult;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use super::error::ExportError;

/// Local datetime formats accepted for date bounds (interpreted in the station timezone)
const LOCAL_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Sort order on `(timestamp_start, id)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Desc,
    Asc,
}

impl SortDirection {
    /// Parse a caller-supplied order; anything but `asc` keeps the default
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Desc => "DESC",
            Self::Asc => "ASC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

/// Inclusive UTC time window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ExportError> {
        if start > end {
            return Err(ExportError::InvalidDateRange(format!(
                "start ({}) is after end ({})",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a range from raw request bounds
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]` (space or `T`) in `tz`, and
    /// bare `YYYY-MM-DD` (start of day for `start`, 23:59:59 for `end`).
    /// Missing or blank bounds default to the current day in `tz`.
    pub fn parse(
        start: Option<&str>,
        end: Option<&str>,
        tz: &Tz,
        now: DateTime<Utc>,
    ) -> Result<Self, ExportError> {
        let today = now.with_timezone(tz).date_naive();
        let start = resolve_bound(start, tz, today, Bound::Start)?;
        let end = resolve_bound(end, tz, today, Bound::End)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether a Unix-seconds timestamp falls inside the range
    pub fn contains_unix(&self, secs: i64) -> bool {
        (self.start.timestamp()..=self.end.timestamp()).contains(&secs)
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::MIN + TimeDelta::seconds(86_399)
}

fn resolve_bound(
    raw: Option<&str>,
    tz: &Tz,
    today: NaiveDate,
    bound: Bound,
) -> Result<DateTime<Utc>, ExportError> {
    let name = match bound {
        Bound::Start => "start",
        Bound::End => "end",
    };

    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_bound(raw, tz, bound).ok_or_else(|| {
            ExportError::InvalidDateRange(format!("unrecognized {} date '{}'", name, raw))
        }),
        None => {
            let time = match bound {
                Bound::Start => NaiveTime::MIN,
                Bound::End => end_of_day(),
            };
            local_to_utc(tz, today.and_time(time), bound).ok_or_else(|| {
                ExportError::InvalidDateRange(format!("no valid default {} for today", name))
            })
        }
    }
}

fn parse_bound(raw: &str, tz: &Tz, bound: Bound) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in LOCAL_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return local_to_utc(tz, naive, bound);
        }
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => end_of_day(),
    };
    local_to_utc(tz, date.and_time(time), bound)
}

/// Resolve a wall-clock time in `tz`, widening the window on DST edges
fn local_to_utc(tz: &Tz, naive: NaiveDateTime, bound: Bound) -> Option<DateTime<Utc>> {
    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, latest) => match bound {
            Bound::Start => earliest,
            Bound::End => latest,
        },
        // Skipped by a DST jump: the first instant after the gap
        LocalResult::None => tz
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest()?,
    };
    Some(local.with_timezone(&Utc))
}

/// Immutable, station-scoped history filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    station_id: i64,
    range: DateRange,
    search: Option<String>,
    direction: SortDirection,
}

impl HistoryQuery {
    pub fn builder(station_id: i64, range: DateRange) -> HistoryQueryBuilder {
        HistoryQueryBuilder {
            query: HistoryQuery {
                station_id,
                range,
                search: None,
                direction: SortDirection::default(),
            },
        }
    }

    pub fn station_id(&self) -> i64 {
        self.station_id
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    /// Trimmed, non-empty search phrase
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

/// Refines a [`HistoryQuery`]; each step consumes the builder
#[derive(Debug, Clone)]
pub struct HistoryQueryBuilder {
    query: HistoryQuery,
}

impl HistoryQueryBuilder {
    /// Add a free-text filter over title and artist; blank input adds none
    pub fn search(mut self, phrase: Option<&str>) -> Self {
        self.query.search = phrase
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }

    pub fn direction(mut self, direction: SortDirection) -> Self {
        self.query.direction = direction;
        self
    }

    pub fn build(self) -> HistoryQuery {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_parse_rfc3339_honours_offset() {
        let range = DateRange::parse(
            Some("2024-05-01T10:00:00+02:00"),
            Some("2024-05-01T12:00:00Z"),
            &chrono_tz::UTC,
            utc("2024-06-01T00:00:00Z"),
        )
        .unwrap();
        assert_eq!(range.start(), utc("2024-05-01T08:00:00Z"));
        assert_eq!(range.end(), utc("2024-05-01T12:00:00Z"));
    }

    #[test]
    fn test_parse_local_datetime_in_station_timezone() {
        let tz = chrono_tz::Europe::Berlin;
        let range = DateRange::parse(
            Some("2024-05-01 10:00"),
            Some("2024-05-01T11:30:15"),
            &tz,
            utc("2024-06-01T00:00:00Z"),
        )
        .unwrap();
        // CEST is UTC+2
        assert_eq!(range.start(), utc("2024-05-01T08:00:00Z"));
        assert_eq!(range.end(), utc("2024-05-01T09:30:15Z"));
    }

    #[test]
    fn test_parse_bare_dates_cover_whole_days() {
        let tz = chrono_tz::America::New_York;
        let range = DateRange::parse(
            Some("2024-01-10"),
            Some("2024-01-11"),
            &tz,
            utc("2024-06-01T00:00:00Z"),
        )
        .unwrap();
        // EST is UTC-5
        assert_eq!(range.start(), utc("2024-01-10T05:00:00Z"));
        assert_eq!(range.end(), utc("2024-01-12T04:59:59Z"));
    }

    #[test]
    fn test_missing_bounds_default_to_today_in_timezone() {
        let tz = chrono_tz::Asia::Tokyo;
        // 2024-03-01 20:00 UTC is already 2024-03-02 05:00 in Tokyo
        let range = DateRange::parse(None, Some("  "), &tz, utc("2024-03-01T20:00:00Z")).unwrap();
        assert_eq!(range.start(), utc("2024-03-01T15:00:00Z"));
        assert_eq!(range.end(), utc("2024-03-02T14:59:59Z"));
        assert_eq!(range.end().with_timezone(&tz).hour(), 23);
    }

    #[test]
    fn test_unparseable_bound_is_rejected() {
        let err = DateRange::parse(
            Some("last tuesday"),
            None,
            &chrono_tz::UTC,
            utc("2024-06-01T00:00:00Z"),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::InvalidDateRange(msg) if msg.contains("last tuesday")));
    }

    #[test]
    fn test_start_after_end_is_rejected() {
        let err = DateRange::parse(
            Some("2024-05-02"),
            Some("2024-05-01"),
            &chrono_tz::UTC,
            utc("2024-06-01T00:00:00Z"),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::InvalidDateRange(_)));
    }

    #[test]
    fn test_dst_gap_moves_forward() {
        // 2024-03-31 02:30 does not exist in Berlin (clocks jump 02:00 -> 03:00)
        let tz = chrono_tz::Europe::Berlin;
        let range = DateRange::parse(
            Some("2024-03-31 02:30"),
            Some("2024-03-31 04:00"),
            &tz,
            utc("2024-06-01T00:00:00Z"),
        )
        .unwrap();
        assert_eq!(range.start(), utc("2024-03-31T01:30:00Z"));
    }

    #[test]
    fn test_contains_unix_is_inclusive() {
        let range = DateRange::new(utc("2024-05-01T00:00:00Z"), utc("2024-05-01T01:00:00Z"))
            .unwrap();
        let start = range.start().timestamp();
        let end = range.end().timestamp();
        assert!(range.contains_unix(start));
        assert!(range.contains_unix(end));
        assert!(!range.contains_unix(start - 1));
        assert!(!range.contains_unix(end + 1));
    }

    #[test]
    fn test_blank_search_equals_omitted() {
        let range = DateRange::new(utc("2024-05-01T00:00:00Z"), utc("2024-05-02T00:00:00Z"))
            .unwrap();
        let omitted = HistoryQuery::builder(1, range).build();
        let blank = HistoryQuery::builder(1, range).search(Some("   ")).build();
        let trimmed = HistoryQuery::builder(1, range)
            .search(Some("  Daft Punk "))
            .build();

        assert_eq!(omitted, blank);
        assert_eq!(blank.search(), None);
        assert_eq!(trimmed.search(), Some("Daft Punk"));
    }

    #[test]
    fn test_builder_defaults_to_descending() {
        let range = DateRange::new(utc("2024-05-01T00:00:00Z"), utc("2024-05-02T00:00:00Z"))
            .unwrap();
        let query = HistoryQuery::builder(7, range).build();
        assert_eq!(query.station_id(), 7);
        assert_eq!(query.direction(), SortDirection::Desc);
        let asc = HistoryQuery::builder(7, range)
            .direction(SortDirection::parse(Some("ASC")))
            .build();
        assert_eq!(asc.direction(), SortDirection::Asc);
    }
}
