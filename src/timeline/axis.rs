use chrono::{Datelike, Days, NaiveDate, Weekday};

use super::TimelineConfig;
use crate::calendar::WorkCalendar;

/// Upper bound on calendar days walked while building an axis.
pub const AXIS_ITERATION_CAP: usize = 5000;

/// `count` consecutive dates from `start`, leaving out Saturdays and
/// Sundays when `skip_weekends` is set.
pub fn compute_axis(start: NaiveDate, count: usize, skip_weekends: bool) -> Vec<NaiveDate> {
    compute_axis_with_calendar(start, count, &WorkCalendar::for_skip_weekends(skip_weekends))
}

/// Like [`compute_axis`] but keeps only days the calendar marks available.
/// Stops early, with fewer than `count` dates, once the iteration cap is hit.
pub fn compute_axis_with_calendar(
    start: NaiveDate,
    count: usize,
    calendar: &WorkCalendar,
) -> Vec<NaiveDate> {
    let mut axis = Vec::with_capacity(count.min(AXIS_ITERATION_CAP));
    let mut current = Some(start);
    let mut steps = 0;
    while axis.len() < count && steps < AXIS_ITERATION_CAP {
        let Some(day) = current else {
            break;
        };
        if calendar.is_available(day) {
            axis.push(day);
        }
        current = day.checked_add_days(Days::new(1));
        steps += 1;
    }
    axis
}

/// Columns the timeline must cover: the longest queue total plus a buffer,
/// never less than the floor.
pub fn horizon<I>(queue_totals: I, config: &TimelineConfig) -> usize
where
    I: IntoIterator<Item = u64>,
{
    let longest = queue_totals.into_iter().max().unwrap_or(0);
    let needed = usize::try_from(longest)
        .unwrap_or(usize::MAX)
        .saturating_add(config.horizon_buffer);
    if longest == 0 {
        config.horizon_floor
    } else {
        needed.max(config.horizon_floor)
    }
}

/// Axis position of `today`: its index when it is a column, `i - 0.5` when
/// it falls in a gap just before column `i`, `None` outside the axis.
pub fn today_marker(axis: &[NaiveDate], today: NaiveDate) -> Option<f64> {
    let idx = axis.iter().position(|d| *d >= today)?;
    if axis[idx] == today {
        Some(idx as f64)
    } else if idx == 0 {
        None
    } else {
        Some(idx as f64 - 0.5)
    }
}

/// Indices of axis columns that open a week (Mondays).
pub fn week_starts(axis: &[NaiveDate]) -> Vec<usize> {
    axis.iter()
        .enumerate()
        .filter(|(_, d)| d.weekday() == Weekday::Mon)
        .map(|(idx, _)| idx)
        .collect()
}
