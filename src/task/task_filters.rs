use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Completion filter for the task list (`?status=`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Completed,
    Pending,
}

impl StatusFilter {
    /// Unknown values mean "no status filter".
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "completed" => Some(StatusFilter::Completed),
            "pending" => Some(StatusFilter::Pending),
            _ => None,
        }
    }

    pub fn completed(self) -> bool {
        matches!(self, StatusFilter::Completed)
    }
}

/// Due-date bucket for the task list (`?due_date_filter=`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDateBucket {
    Overdue,
    Today,
    ThisWeek,
    Later,
    NoDueDate,
}

impl DueDateBucket {
    /// Unknown values mean "no bucket filter".
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "overdue" => Some(DueDateBucket::Overdue),
            "today" => Some(DueDateBucket::Today),
            "this_week" => Some(DueDateBucket::ThisWeek),
            "later" => Some(DueDateBucket::Later),
            "no_due_date" => Some(DueDateBucket::NoDueDate),
            _ => None,
        }
    }

    /// Resolves the bucket to concrete instants. Day boundaries are taken in
    /// the `offset` time zone.
    pub fn window(self, now: DateTime<Utc>, offset: FixedOffset) -> DueWindow {
        let (today_start, today_end) = local_day_bounds(now, offset);
        let end_of_week = today_end + Duration::days(6);

        match self {
            DueDateBucket::Overdue => DueWindow::PendingBefore(now),
            DueDateBucket::Today => DueWindow::Between(today_start, today_end),
            DueDateBucket::ThisWeek => DueWindow::Between(now, end_of_week),
            DueDateBucket::Later => DueWindow::After(end_of_week),
            DueDateBucket::NoDueDate => DueWindow::Unscheduled,
        }
    }
}

/// A due-date predicate with all times resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueWindow {
    /// Not completed and due strictly before the instant.
    PendingBefore(DateTime<Utc>),
    /// Due within the inclusive range.
    Between(DateTime<Utc>, DateTime<Utc>),
    /// Due strictly after the instant.
    After(DateTime<Utc>),
    /// No due date.
    Unscheduled,
}

/// First and last microsecond of the local calendar day containing `now`.
pub fn local_day_bounds(now: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_date = now.with_timezone(&offset).date_naive();
    let start = local_date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let end = local_date
        .and_hms_micro_opt(23, 59, 59, 999_999)
        .unwrap_or_default();

    // A fixed offset maps every local time to exactly one instant.
    let to_utc = |naive: NaiveDateTime| {
        offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now)
    };

    (to_utc(start), to_utc(end))
}

/// Turns free text into an `ILIKE` pattern that matches it anywhere, with the
/// wildcard characters in the input taken literally.
pub fn contains_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_parse_ignores_unknown_values() {
        assert_eq!(StatusFilter::parse("completed"), Some(StatusFilter::Completed));
        assert_eq!(StatusFilter::parse("pending"), Some(StatusFilter::Pending));
        assert_eq!(StatusFilter::parse("archived"), None);
        assert_eq!(DueDateBucket::parse("this_week"), Some(DueDateBucket::ThisWeek));
        assert_eq!(DueDateBucket::parse("someday"), None);
    }

    #[test]
    fn test_today_is_the_local_day() {
        // 22:30 UTC is already the next day at UTC+3.
        let now = utc(2025, 3, 10, 22, 30);
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();

        assert_eq!(
            DueDateBucket::Today.window(now, offset),
            DueWindow::Between(
                utc(2025, 3, 10, 21, 0),
                utc(2025, 3, 11, 20, 59) + Duration::seconds(59) + Duration::microseconds(999_999),
            )
        );
    }

    #[test]
    fn test_today_in_utc() {
        let now = utc(2025, 3, 10, 9, 15);
        let (start, end) = local_day_bounds(now, FixedOffset::east_opt(0).unwrap());

        assert_eq!(start, utc(2025, 3, 10, 0, 0));
        assert_eq!(end + Duration::microseconds(1), utc(2025, 3, 11, 0, 0));
    }

    #[test]
    fn test_west_of_utc_keeps_previous_day() {
        // 02:00 UTC is still the 9th at UTC-5.
        let now = utc(2025, 3, 10, 2, 0);
        let (start, _) = local_day_bounds(now, FixedOffset::west_opt(5 * 3600).unwrap());
        assert_eq!(start, utc(2025, 3, 9, 5, 0));
    }

    #[test]
    fn test_overdue_is_pending_before_now() {
        let now = utc(2025, 3, 10, 9, 0);
        assert_eq!(
            DueDateBucket::Overdue.window(now, FixedOffset::east_opt(0).unwrap()),
            DueWindow::PendingBefore(now)
        );
    }

    #[test]
    fn test_this_week_and_later_meet_at_end_of_week() {
        let now = utc(2025, 3, 10, 9, 0);
        let offset = FixedOffset::east_opt(0).unwrap();
        let end_of_week = utc(2025, 3, 16, 23, 59) + Duration::seconds(59) + Duration::microseconds(999_999);

        assert_eq!(
            DueDateBucket::ThisWeek.window(now, offset),
            DueWindow::Between(now, end_of_week)
        );
        assert_eq!(DueDateBucket::Later.window(now, offset), DueWindow::After(end_of_week));
    }

    #[test]
    fn test_no_due_date() {
        let window = DueDateBucket::NoDueDate.window(Utc::now(), FixedOffset::east_opt(0).unwrap());
        assert_eq!(window, DueWindow::Unscheduled);
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("milk"), "%milk%");
        assert_eq!(contains_pattern("100%_done"), "%100\\%\\_done%");
    }
}
