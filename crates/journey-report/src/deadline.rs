//! Deadline classification and the CFP schedule

use crate::error::ReportError;
use chrono::{DateTime, NaiveDate, Utc};
use journey_core::CfpSubmission;
use serde::Serialize;
use std::fmt;

/// Days ahead that still count as due soon
pub const DUE_SOON_DAYS: i64 = 7;

/// Where a deadline falls relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum DeadlineStatus {
    Overdue,
    DueToday,
    /// 1..=7 days away
    DueSoon(i64),
    /// Further out
    Upcoming(NaiveDate),
}

impl DeadlineStatus {
    /// Classify by calendar days between `today` and `deadline`
    #[must_use]
    pub fn between(today: NaiveDate, deadline: NaiveDate) -> Self {
        let days = (deadline - today).num_days();
        match days {
            d if d < 0 => Self::Overdue,
            0 => Self::DueToday,
            d if d <= DUE_SOON_DAYS => Self::DueSoon(d),
            _ => Self::Upcoming(deadline),
        }
    }

    /// Needs attention within a week
    #[inline]
    #[must_use]
    pub fn is_urgent(&self) -> bool {
        !matches!(self, Self::Upcoming(_))
    }
}

impl fmt::Display for DeadlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overdue => f.write_str("Overdue"),
            Self::DueToday => f.write_str("Due Today"),
            Self::DueSoon(1) => f.write_str("In 1 day"),
            Self::DueSoon(days) => write!(f, "In {days} days"),
            Self::Upcoming(date) => write!(f, "{}", date.format("%b %-d, %Y")),
        }
    }
}

/// Parse a deadline as a UTC calendar date
///
/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, which is converted to
/// UTC before the time is dropped.
///
/// # Errors
/// - `ReportError::InvalidDeadline`
pub fn parse_deadline(deadline: &str) -> Result<NaiveDate, ReportError> {
    let trimmed = deadline.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|ts| ts.with_timezone(&Utc).date_naive())
        .map_err(|e| ReportError::InvalidDeadline {
            deadline: deadline.to_string(),
            message: e.to_string(),
        })
}

/// Classify a raw deadline against today
///
/// # Errors
/// - `ReportError::InvalidDeadline`
pub fn classify_deadline(today: NaiveDate, deadline: &str) -> Result<DeadlineStatus, ReportError> {
    parse_deadline(deadline).map(|date| DeadlineStatus::between(today, date))
}

/// A submission with its classified deadline
#[derive(Debug)]
pub struct CfpEntry {
    pub submission: CfpSubmission,
    pub status: Result<DeadlineStatus, ReportError>,
}

impl CfpEntry {
    /// Status label, or the parse error text
    #[must_use]
    pub fn label(&self) -> String {
        match &self.status {
            Ok(status) => status.to_string(),
            Err(e) => e.to_string(),
        }
    }
}

/// Submissions ordered by deadline, unparseable deadlines last
#[must_use]
pub fn cfp_schedule(submissions: Vec<CfpSubmission>, today: NaiveDate) -> Vec<CfpEntry> {
    let mut dated: Vec<(Option<NaiveDate>, CfpEntry)> = submissions
        .into_iter()
        .map(|submission| {
            let parsed = parse_deadline(&submission.deadline);
            let date = parsed.as_ref().ok().copied();
            if let Err(e) = &parsed {
                tracing::warn!(id = %submission.id, error = %e, "unparseable CFP deadline");
            }
            let status = parsed.map(|d| DeadlineStatus::between(today, d));
            (date, CfpEntry { submission, status })
        })
        .collect();

    dated.sort_by_key(|(date, _)| (date.is_none(), *date));
    dated.into_iter().map(|(_, entry)| entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
    }

    fn offset(days: i64) -> String {
        (today() + Duration::days(days)).format("%Y-%m-%d").to_string()
    }

    fn label(deadline: &str) -> String {
        classify_deadline(today(), deadline).unwrap().to_string()
    }

    #[test]
    fn relative_labels() {
        assert_eq!(label(&offset(0)), "Due Today");
        assert_eq!(label(&offset(5)), "In 5 days");
        assert_eq!(label(&offset(1)), "In 1 day");
        assert_eq!(label(&offset(7)), "In 7 days");
        assert_eq!(label(&offset(-1)), "Overdue");
    }

    #[test]
    fn far_deadlines_show_the_date() {
        assert_eq!(label(&offset(30)), "Jun 19, 2026");
        assert_eq!(label(&offset(8)), "May 28, 2026");
    }

    #[test]
    fn timestamps_use_the_utc_date() {
        // 23:30 at -05:00 is already the next day in UTC
        assert_eq!(label("2026-05-19T23:30:00-05:00"), "Due Today");
        assert_eq!(label("2026-05-20T00:15:00+02:00"), "Overdue");
    }

    #[test]
    fn garbage_is_an_error() {
        let err = classify_deadline(today(), "next tuesday").unwrap_err();
        assert!(matches!(err, ReportError::InvalidDeadline { .. }));
    }

    #[test]
    fn schedule_orders_by_date() {
        let cfp = |id: &str, deadline: &str| CfpSubmission {
            id: id.into(),
            conference_name: format!("Conf {id}"),
            talk_title: "Talk".into(),
            deadline: deadline.into(),
            status: None,
        };
        let schedule = cfp_schedule(
            vec![
                cfp("late", "2026-09-01"),
                cfp("bad", "soon"),
                cfp("past", "2026-05-01"),
                cfp("today", "2026-05-20"),
            ],
            today(),
        );
        let ids: Vec<_> = schedule.iter().map(|e| e.submission.id.as_str()).collect();
        assert_eq!(ids, ["past", "today", "late", "bad"]);
        assert_eq!(schedule[0].label(), "Overdue");
        assert!(schedule[1].status.as_ref().unwrap().is_urgent());
        assert!(schedule[3].status.is_err());
    }
}
