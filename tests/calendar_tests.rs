use chrono::{NaiveDate, Weekday};
use queue_board::{WorkCalendar, WorkCalendarConfig, timeline::compute_axis_with_calendar};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn default_calendar_weekends_unavailable() {
    let cal = WorkCalendar::default();
    // 2025-01-04 is a Saturday, 2025-01-05 is a Sunday
    assert!(!cal.is_available(d(2025, 1, 4)));
    assert!(!cal.is_available(d(2025, 1, 5)));
    assert!(cal.is_available(d(2025, 1, 6)));
}

#[test]
fn every_day_calendar_keeps_weekends() {
    let cal = WorkCalendar::for_skip_weekends(false);
    assert!(cal.is_available(d(2025, 1, 4)));
    assert_eq!(cal, WorkCalendar::every_day());
}

#[test]
fn holidays_are_removed_from_the_axis() {
    let config = WorkCalendarConfig::new(
        [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
        [d(2025, 1, 1), d(2025, 1, 3)],
    )
    .unwrap();
    let cal = WorkCalendar::from_config(&config).unwrap();
    let axis = compute_axis_with_calendar(d(2024, 12, 31), 3, &cal);
    assert_eq!(axis, vec![d(2024, 12, 31), d(2025, 1, 2), d(2025, 1, 6)]);
}

#[test]
fn set_working_days_includes_saturday() {
    let mut cal = WorkCalendar::default();
    cal.set_working_days(&[
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ])
    .unwrap();
    assert!(cal.is_available(d(2025, 1, 4)));
    assert!(!cal.is_available(d(2025, 1, 5)));
    assert!(cal.set_working_days(&[]).is_err());
    assert!(cal.is_available(d(2025, 1, 4)));
}

#[test]
fn calendar_without_working_days_is_rejected() {
    assert!(WorkCalendarConfig::new(Vec::new(), Vec::new()).is_err());
    assert!(WorkCalendarConfig::new(Vec::new(), vec![d(2025, 1, 1)]).is_err());
    let err = serde_json::from_str::<WorkCalendar>(r#"{"working_days":[]}"#);
    assert!(err.is_err());
}

#[test]
fn config_round_trips_through_json() {
    let config = WorkCalendarConfig::new(
        [Weekday::Fri, Weekday::Mon, Weekday::Mon],
        [d(2025, 12, 25), d(2025, 1, 1)],
    )
    .unwrap();
    let cal = WorkCalendar::from_config(&config).unwrap();
    assert_eq!(WorkCalendarConfig::from(&cal), config);
    assert_eq!(config.working_days(), &[Weekday::Mon, Weekday::Fri]);
    assert_eq!(config.holidays(), &[d(2025, 1, 1), d(2025, 12, 25)]);

    let json = serde_json::to_string(&cal).unwrap();
    let back: WorkCalendar = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cal);
}

#[test]
fn axis_stops_at_the_iteration_cap() {
    let mut cal = WorkCalendar::weekdays();
    cal.set_working_days(&[Weekday::Mon]).unwrap();
    let axis = compute_axis_with_calendar(d(2024, 1, 1), 10_000, &cal);
    assert!(axis.len() < 10_000);
    assert!(axis.len() <= queue_board::timeline::AXIS_ITERATION_CAP / 7 + 1);
}
