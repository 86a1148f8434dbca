//! Month grid rendering.

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{Datelike, Days, NaiveDate, TimeZone};

use crate::event::Event;

const WEEKDAYS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
const TODAY_MARKER: char = '*';
const EVENT_MARKER: char = '•';

/// A month calendar grid with the events falling in that month.
#[derive(Debug, Clone)]
pub struct MonthView {
    first_day: NaiveDate,
    today: NaiveDate,
    events: Vec<Event>,
}

impl MonthView {
    /// Creates a month view. Returns `None` for an invalid year/month.
    pub fn new(year: i32, month: u32, today: NaiveDate, events: Vec<Event>) -> Option<Self> {
        Some(Self {
            first_day: NaiveDate::from_ymd_opt(year, month, 1)?,
            today,
            events,
        })
    }

    /// Renders the grid only.
    pub fn render<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut out = String::new();
        out.push_str(&format!("  {}\n\n", self.first_day.format("%B %Y")));

        let header: String = WEEKDAYS.iter().map(|day| format!(" {:>3}", day)).collect();
        out.push_str(&header);
        out.push('\n');
        out.push_str(&"-".repeat(28));
        out.push('\n');

        let by_day = self.events_by_day(tz);
        let leading = self.first_day.weekday().num_days_from_sunday() as usize;
        let days_in_month = self.days_in_month();

        let mut cells: Vec<Option<NaiveDate>> = vec![None; leading];
        cells.extend((0..days_in_month).map(|offset| {
            self.first_day.checked_add_days(Days::new(u64::from(offset)))
        }));

        for week in cells.chunks(7) {
            for cell in week {
                match cell {
                    Some(date) => {
                        let marker = if *date == self.today {
                            TODAY_MARKER
                        } else if by_day.contains_key(date) {
                            EVENT_MARKER
                        } else {
                            ' '
                        };
                        out.push_str(&format!(" {:>2}{}", date.day(), marker));
                    }
                    None => out.push_str("    "),
                }
            }
            out.push('\n');
        }
        out.push('\n');
        out
    }

    /// Renders the grid followed by the events grouped by day.
    pub fn render_with_events<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut out = self.render(tz);
        let by_day = self.events_by_day(tz);

        if by_day.is_empty() {
            out.push_str("No events this month.\n");
            return out;
        }

        out.push_str("Events:\n");
        out.push_str(&"-".repeat(50));
        out.push('\n');

        for (date, events) in by_day {
            out.push_str(&format!("\n{}:\n", date.format("%a %Y-%m-%d")));
            for event in events {
                let line = if event.all_day {
                    format!("  all-day {}\n", event.summary)
                } else {
                    let start = event.start.with_timezone(tz);
                    format!("  {} {}\n", start.format("%H:%M"), event.summary)
                };
                out.push_str(&line);
            }
        }
        out.push('\n');
        out
    }

    fn days_in_month(&self) -> u32 {
        self.first_day
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.pred_opt())
            .map_or(31, |last| last.day())
    }

    /// Groups this month's events by local start date, ordered by start.
    fn events_by_day<Tz: TimeZone>(&self, tz: &Tz) -> BTreeMap<NaiveDate, Vec<&Event>> {
        let mut by_day: BTreeMap<NaiveDate, Vec<&Event>> = BTreeMap::new();
        for event in &self.events {
            let date = event.start.with_timezone(tz).date_naive();
            if date.year() == self.first_day.year() && date.month() == self.first_day.month() {
                by_day.entry(date).or_default().push(event);
            }
        }
        for events in by_day.values_mut() {
            events.sort_by_key(|event| event.start);
        }
        by_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventZone;
    use chrono::{Duration, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(title: &str, d: u32, h: u32) -> Event {
        let start = Utc.with_ymd_and_hms(2025, 2, d, h, 0, 0).unwrap();
        Event::new(title, title, start, start + Duration::hours(1))
    }

    #[test]
    fn header_and_weekdays() {
        let view = MonthView::new(2025, 2, date(2025, 3, 20), vec![]).unwrap();
        let output = view.render(&Utc);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "  February 2025");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "  Su  Mo  Tu  We  Th  Fr  Sa");
        assert_eq!(lines[3], "-".repeat(28));
    }

    #[test]
    fn first_week_is_offset_to_weekday() {
        // February 1st 2025 is a Saturday.
        let view = MonthView::new(2025, 2, date(2025, 3, 20), vec![]).unwrap();
        let output = view.render(&Utc);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[4], format!("{}  1 ", " ".repeat(24)));
        assert_eq!(lines[5], "  2   3   4   5   6   7   8 ");
        // Four more rows, then the trailing blank line.
        assert_eq!(lines[9], "");
        assert_eq!(lines.len(), 10);
    }

    #[test]
    fn markers_for_today_and_events() {
        let events = vec![event("Review", 5, 9), event("Lunch", 10, 12)];
        let view = MonthView::new(2025, 2, date(2025, 2, 10), events).unwrap();
        let output = view.render(&Utc);

        assert!(output.contains("  5•"));
        // Today wins over the event marker.
        assert!(output.contains(" 10*"));
        assert!(output.contains("  6 "));
    }

    #[test]
    fn events_listed_by_day() {
        let events = vec![event("Late", 5, 15), event("Early", 5, 9), event("Other", 12, 10)];
        let view = MonthView::new(2025, 2, date(2025, 3, 1), events).unwrap();
        let output = view.render_with_events(&Utc);

        let listing = output.split("Events:\n").nth(1).unwrap();
        assert_eq!(
            listing,
            format!(
                "{}\n\nWed 2025-02-05:\n  09:00 Early\n  15:00 Late\n\nWed 2025-02-12:\n  10:00 Other\n\n",
                "-".repeat(50)
            )
        );
    }

    #[test]
    fn events_outside_month_are_ignored() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let march = Event::new("m", "March", start, start);
        let view = MonthView::new(2025, 2, date(2025, 3, 1), vec![march]).unwrap();

        let output = view.render_with_events(&Utc);
        assert!(output.ends_with("No events this month.\n"));
    }

    #[test]
    fn full_grid_for_month_starting_on_sunday() {
        let start = Utc.with_ymd_and_hms(2025, 6, 3, 10, 0, 0).unwrap();
        let dentist = Event::new("d", "Dentist", start, start + Duration::hours(1));
        let view = MonthView::new(2025, 6, date(2025, 6, 18), vec![dentist]).unwrap();

        assert_eq!(
            view.render(&Utc),
            "  June 2025\n\n\
             \x20 Su  Mo  Tu  We  Th  Fr  Sa\n\
             ----------------------------\n\
             \x20 1   2   3•  4   5   6   7 \n\
             \x20 8   9  10  11  12  13  14 \n\
             \x2015  16  17  18* 19  20  21 \n\
             \x2022  23  24  25  26  27  28 \n\
             \x2029  30 \n\n"
        );
    }

    #[test]
    fn zoned_all_day_event_is_filed_under_its_local_date() {
        let berlin = chrono_tz::Europe::Berlin;
        // Midnight CET on 27 Oct 2025 is 23:00 UTC the day before.
        let start = berlin.with_ymd_and_hms(2025, 10, 27, 0, 0, 0).unwrap().with_timezone(&Utc);
        let holiday = Event::new("h", "Holiday", start, start + Duration::days(1))
            .with_all_day(true)
            .with_zone(EventZone::Named(berlin));
        let view = MonthView::new(2025, 10, date(2025, 10, 1), vec![holiday]).unwrap();

        let output = view.render_with_events(&berlin);
        assert!(output.contains("\nMon 2025-10-27:\n  all-day Holiday\n"));
        assert!(output.contains(" 27•"));
    }

    #[test]
    fn invalid_month() {
        assert!(MonthView::new(2025, 0, date(2025, 1, 1), vec![]).is_none());
    }
}
