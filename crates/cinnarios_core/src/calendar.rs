//! crates/cinnarios_core/src/calendar.rs
//!
//! Projects registration records onto a month grid and finds same-day conflicts.
//!
//! Days are keyed by the *registration* timestamp of a record, converted to
//! the projector's time zone, not by the date the event itself takes place.

use crate::domain::RegistrationRecord;
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};

//=========================================================================================
// Month Navigation
//=========================================================================================

/// A displayed month, held as its first day so every cursor names a month
/// chrono can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    first: NaiveDate,
}

impl MonthCursor {
    /// `month` is 1-based. Years outside chrono's date range are rejected.
    pub fn new(year: i32, month: u32) -> CoreResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::Validation(format!("Invalid month: {month}")));
        }
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| CoreError::Validation(format!("Year out of range: {year}")))?;
        Ok(Self { first })
    }

    /// The month that `date` falls in.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    /// One month forward; December rolls over to January of the next year.
    /// `None` past the last representable month.
    pub fn next(self) -> Option<Self> {
        self.first
            .checked_add_months(Months::new(1))
            .map(|first| Self { first })
    }

    /// One month back; January rolls over to December of the previous year.
    /// `None` before the first representable month.
    pub fn previous(self) -> Option<Self> {
        self.first
            .checked_sub_months(Months::new(1))
            .map(|first| Self { first })
    }

    /// "March 2024"
    pub fn label(&self) -> String {
        self.first.format("%B %Y").to_string()
    }

    /// The date of `day` in this month, if the month has that day.
    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        self.first.with_day(day)
    }

    pub fn days_in_month(&self) -> u32 {
        (29..=31)
            .rev()
            .find(|&day| self.date(day).is_some())
            .unwrap_or(28)
    }

    /// Number of blank cells before the 1st, with weeks starting on Sunday.
    pub fn leading_blanks(&self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }
}

//=========================================================================================
// Grid Types
//=========================================================================================

/// One populated day of a month grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub day: u32,
    pub events: Vec<RegistrationRecord>,
}

impl DayCell {
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

/// A 7-column month grid. Leading `None` cells pad the first week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub cursor: MonthCursor,
    pub cells: Vec<Option<DayCell>>,
}

impl MonthGrid {
    pub fn weeks(&self) -> impl Iterator<Item = &[Option<DayCell>]> {
        self.cells.chunks(7)
    }

    pub fn day(&self, day: u32) -> Option<&DayCell> {
        self.cells.iter().flatten().find(|cell| cell.day == day)
    }
}

/// Two records registered on the same calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub first: RegistrationRecord,
    pub second: RegistrationRecord,
}

//=========================================================================================
// Projector
//=========================================================================================

pub struct CalendarProjector<Tz: TimeZone> {
    tz: Tz,
}

impl<Tz: TimeZone> CalendarProjector<Tz> {
    /// Creates a projector that groups timestamps by calendar day in `tz`.
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    fn local_date(&self, instant: &DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// The month containing `now` in the projector's time zone.
    pub fn current_month(&self, now: &DateTime<Utc>) -> MonthCursor {
        MonthCursor::containing(self.local_date(now))
    }

    pub fn render_month(
        &self,
        year: i32,
        month: u32,
        records: &[RegistrationRecord],
    ) -> CoreResult<MonthGrid> {
        Ok(self.render(MonthCursor::new(year, month)?, records))
    }

    pub fn render(&self, cursor: MonthCursor, records: &[RegistrationRecord]) -> MonthGrid {
        let blanks = cursor.leading_blanks() as usize;
        let days = cursor.days_in_month();

        let mut cells: Vec<Option<DayCell>> = Vec::with_capacity(blanks + days as usize);
        cells.resize(blanks, None);
        for day in 1..=days {
            let events = cursor
                .date(day)
                .map(|date| self.events_for_day(date, records))
                .unwrap_or_default();
            cells.push(Some(DayCell { day, events }));
        }

        MonthGrid { cursor, cells }
    }

    /// Records registered on `date`, in ledger order.
    pub fn events_for_day(
        &self,
        date: NaiveDate,
        records: &[RegistrationRecord],
    ) -> Vec<RegistrationRecord> {
        records
            .iter()
            .filter(|record| self.local_date(&record.registered_at) == date)
            .cloned()
            .collect()
    }

    /// Every pair of records sharing a calendar day, in insertion order of the
    /// first element and then the second. Three records on one day give three pairs.
    pub fn detect_conflicts(&self, records: &[RegistrationRecord]) -> Vec<Conflict> {
        let dates: Vec<NaiveDate> = records
            .iter()
            .map(|record| self.local_date(&record.registered_at))
            .collect();

        let mut conflicts = Vec::new();
        for i in 0..records.len() {
            for j in (i + 1)..records.len() {
                if dates[i] == dates[j] {
                    conflicts.push(Conflict {
                        first: records[i].clone(),
                        second: records[j].clone(),
                    });
                }
            }
        }
        conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn record(event_id: &str, registered_at: &str) -> RegistrationRecord {
        RegistrationRecord {
            event_id: event_id.to_string(),
            title: format!("Event {event_id}"),
            registered_at: DateTime::parse_from_rfc3339(registered_at)
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_month_navigation_carries_year() {
        let december = MonthCursor::new(2024, 12).unwrap();
        assert_eq!(december.next(), Some(MonthCursor::new(2025, 1).unwrap()));

        let january = MonthCursor::new(2024, 1).unwrap();
        assert_eq!(january.previous(), Some(MonthCursor::new(2023, 12).unwrap()));

        let june = MonthCursor::new(2024, 6).unwrap();
        assert_eq!(june.next().and_then(MonthCursor::previous), Some(june));
        assert_eq!(june.label(), "June 2024");
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(MonthCursor::new(2024, 0).is_err());
        assert!(MonthCursor::new(2024, 13).is_err());
    }

    #[test]
    fn test_unrepresentable_years_rejected() {
        assert!(MonthCursor::new(i32::MAX, 12).is_err());
        assert!(MonthCursor::new(i32::MIN, 1).is_err());
        assert!(MonthCursor::new(300_000, 3).is_err());

        let projector = CalendarProjector::new(Utc);
        assert!(matches!(
            projector.render_month(300_000, 3, &[]),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_navigation_stops_at_date_range_edges() {
        let last = MonthCursor::new(NaiveDate::MAX.year(), 12).unwrap();
        assert_eq!(last.next(), None);
        assert_eq!(last.days_in_month(), 31);

        let grid = CalendarProjector::new(Utc).render(last, &[]);
        assert_eq!(grid.cells.len(), last.leading_blanks() as usize + 31);
        assert_eq!(grid.cells.last().unwrap().as_ref().unwrap().day, 31);

        let first = MonthCursor::new(NaiveDate::MIN.year(), 1).unwrap();
        assert_eq!(first.previous(), None);
        assert_eq!(first.days_in_month(), 31);
    }

    #[test]
    fn test_render_month_layout() {
        let projector = CalendarProjector::new(Utc);
        // 2024-03-01 is a Friday.
        let grid = projector.render_month(2024, 3, &[]).unwrap();
        assert_eq!(grid.cells.iter().take_while(|c| c.is_none()).count(), 5);
        assert_eq!(grid.cells.len(), 5 + 31);
        assert_eq!(grid.weeks().count(), 6);
        assert_eq!(grid.weeks().next().unwrap()[5].as_ref().unwrap().day, 1);

        let february = projector.render_month(2024, 2, &[]).unwrap();
        assert_eq!(february.cursor.days_in_month(), 29);
        // 2024-09-01 is a Sunday.
        assert_eq!(MonthCursor::new(2024, 9).unwrap().leading_blanks(), 0);
    }

    #[test]
    fn test_render_month_groups_by_registration_day() {
        let projector = CalendarProjector::new(Utc);
        let records = vec![
            record("1", "2024-03-15T09:00:00Z"),
            record("2", "2024-03-15T18:45:00Z"),
            record("3", "2024-03-20T12:00:00Z"),
            record("4", "2024-04-15T12:00:00Z"),
        ];

        let grid = projector.render_month(2024, 3, &records).unwrap();
        let fifteenth = grid.day(15).unwrap();
        assert_eq!(fifteenth.events.len(), 2);
        assert_eq!(fifteenth.events[0].event_id, "1");
        assert_eq!(grid.day(20).unwrap().events.len(), 1);
        assert!(!grid.day(16).unwrap().has_events());
        let total: usize = grid.cells.iter().flatten().map(|c| c.events.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_local_day_follows_time_zone() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let projector = CalendarProjector::new(plus_two);
        let records = vec![record("1", "2024-03-01T23:30:00Z")];

        let grid = projector.render_month(2024, 3, &records).unwrap();
        assert!(grid.day(2).unwrap().has_events());
        assert!(!grid.day(1).unwrap().has_events());
    }

    #[test]
    fn test_two_same_day_records_conflict_once() {
        let projector = CalendarProjector::new(Utc);
        let records = vec![
            record("1", "2024-03-15T09:00:00Z"),
            record("2", "2024-03-15T17:00:00Z"),
        ];

        let conflicts = projector.detect_conflicts(&records);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].first.event_id, "1");
        assert_eq!(conflicts[0].second.event_id, "2");
    }

    #[test]
    fn test_three_same_day_records_give_three_pairs() {
        let projector = CalendarProjector::new(Utc);
        let records = vec![
            record("a", "2024-03-15T08:00:00Z"),
            record("b", "2024-03-15T09:00:00Z"),
            record("c", "2024-03-15T10:00:00Z"),
        ];

        let pairs: Vec<(String, String)> = projector
            .detect_conflicts(&records)
            .into_iter()
            .map(|c| (c.first.event_id, c.second.event_id))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "b".to_string()),
                ("a".to_string(), "c".to_string()),
                ("b".to_string(), "c".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_overlap_no_conflicts() {
        let projector = CalendarProjector::new(Utc);
        let records = vec![
            record("1", "2024-03-15T09:00:00Z"),
            record("2", "2024-03-16T09:00:00Z"),
            record("3", "2025-03-15T09:00:00Z"),
        ];
        assert!(projector.detect_conflicts(&records).is_empty());
        assert!(projector.detect_conflicts(&[]).is_empty());
    }
}
