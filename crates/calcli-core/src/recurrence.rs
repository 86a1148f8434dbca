//! Recurrence expansion.
//!
//! Turns a recurring [`Event`] into the concrete occurrences that intersect a
//! query window. Expansion is pure and never fails: malformed rules are
//! normalized, and a hard step ceiling bounds the work done for unbounded
//! rules over distant windows.
//!
//! The cursor moves on wall-clock time in the event's [`EventZone`], so
//! occurrences keep their local time of day across DST changes.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, Utc};
use tracing::trace;

use crate::event::{Event, Frequency};

/// Default maximum number of cursor steps per expansion.
pub const DEFAULT_MAX_OCCURRENCES: usize = 5000;

/// The result of expanding one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Occurrences overlapping the window, ordered by start.
    pub events: Vec<Event>,
    /// Set when the step ceiling stopped expansion before the rule did.
    pub truncated: bool,
}

impl Expansion {
    fn single(event: &Event) -> Self {
        Self {
            events: vec![event.clone()],
            truncated: false,
        }
    }
}

/// Expands `event` over `[window_start, window_end]` with the default ceiling.
pub fn expand_default(
    event: &Event,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Expansion {
    expand(event, window_start, window_end, DEFAULT_MAX_OCCURRENCES)
}

/// Expands `event` over the inclusive window `[window_start, window_end]`.
///
/// A non-recurring event is returned as-is regardless of the window.
///
/// For a recurring event a cursor walks from the event's start. At each
/// position expansion stops when the cursor is past `window_end`, past the
/// rule's `until`, or when `count` positions have been evaluated (positions
/// filtered out by the window count too). Otherwise an instance is emitted if
/// its span overlaps the window.
///
/// At most `max_occurrences` positions are evaluated (`0` selects
/// [`DEFAULT_MAX_OCCURRENCES`]). Hitting that ceiling while the rule could
/// still produce positions sets [`Expansion::truncated`].
pub fn expand(
    event: &Event,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    max_occurrences: usize,
) -> Expansion {
    let Some(rule) = event.recurrence.as_ref() else {
        return Expansion::single(event);
    };

    let ceiling = if max_occurrences == 0 {
        DEFAULT_MAX_OCCURRENCES
    } else {
        max_occurrences
    };
    let interval = rule.effective_interval();
    let zone = event.zone;
    let all_day_span = local_span(event);

    let mut expansion = Expansion::default();
    let mut evaluated = 0usize;
    let mut local = zone.local_time(event.start);
    let mut cursor = Some(event.start);

    while let Some(current) = cursor {
        if current > window_end {
            break;
        }
        if rule.until.is_some_and(|until| current > until) {
            break;
        }
        if rule
            .count
            .is_some_and(|count| evaluated >= usize::try_from(count).unwrap_or(usize::MAX))
        {
            break;
        }
        if evaluated >= ceiling {
            trace!(uid = %event.uid, ceiling, "Recurrence expansion hit the step ceiling");
            expansion.truncated = true;
            break;
        }

        let mut instance = event.instance_at(current);
        if let Some(span) = all_day_span {
            // All-day spans are whole local days, not fixed hours.
            if let Some(end) = local.checked_add_signed(span).and_then(|l| zone.resolve(l)) {
                instance.end = end.max(current);
            }
        }
        if instance.end >= window_start {
            expansion.events.push(instance);
        }

        evaluated += 1;
        cursor = next_occurrence(local, rule.frequency, interval).and_then(|next| {
            local = next;
            zone.resolve(next)
        });
    }

    expansion
}

/// Wall-clock span of an all-day event; `None` for timed events, whose
/// occurrences keep their exact duration.
fn local_span(event: &Event) -> Option<Duration> {
    if !event.all_day {
        return None;
    }
    let span = event.zone.local_time(event.end) - event.zone.local_time(event.start);
    Some(if span > Duration::zero() {
        span
    } else {
        Duration::days(1)
    })
}

/// Advances the wall-clock time `current` by `interval` units of `frequency`.
///
/// Returns `None` when the date arithmetic leaves chrono's supported range.
fn next_occurrence(
    current: NaiveDateTime,
    frequency: Frequency,
    interval: u32,
) -> Option<NaiveDateTime> {
    match frequency {
        Frequency::Daily => current.checked_add_days(Days::new(u64::from(interval))),
        Frequency::Weekly => current.checked_add_days(Days::new(7 * u64::from(interval))),
        Frequency::Monthly => add_months_rolling(current, i64::from(interval)),
        Frequency::Yearly => add_months_rolling(current, 12 * i64::from(interval)),
    }
}

/// Adds whole months keeping the day of month, letting days past the end of
/// the target month roll into the following month (Jan 31 + 1 month is
/// Mar 3 in a common year).
fn add_months_rolling(current: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let total = i64::from(current.year()) * 12 + i64::from(current.month0()) + months;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;

    let date = NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_days(Days::new(u64::from(current.day0())))?;
    Some(date.and_time(current.time()))
}
