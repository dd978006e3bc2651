use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{BoardError, BoardResult};

/// Which days the timeline axis may show as columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WorkCalendarConfig", try_from = "WorkCalendarConfig")]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
    #[serde(default)]
    holidays: Vec<NaiveDate>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::weekdays()
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Monday to Friday, no holidays.
    pub fn weekdays() -> Self {
        Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }

    /// Every day is a column.
    pub fn every_day() -> Self {
        Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::new(),
        }
    }

    pub fn for_skip_weekends(skip_weekends: bool) -> Self {
        if skip_weekends {
            Self::weekdays()
        } else {
            Self::every_day()
        }
    }

    pub fn from_config(config: &WorkCalendarConfig) -> BoardResult<Self> {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            return Err(BoardError::invalid(
                "calendar requires at least one working day",
            ));
        }
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();

        Ok(Self {
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
        })
    }

    pub fn set_working_days(&mut self, days: &[Weekday]) -> BoardResult<()> {
        if days.is_empty() {
            return Err(BoardError::invalid(
                "calendar requires at least one working day",
            ));
        }
        self.non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !days.contains(day))
            .collect();
        Ok(())
    }

    /// Check if a date gets a column on the axis
    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> BoardResult<Self>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        if working.is_empty() {
            return Err(BoardError::invalid(
                "calendar requires at least one working day",
            ));
        }
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup();

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Ok(Self {
            working_days: working,
            holidays,
        })
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::default())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let working = WorkCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !calendar.non_working_days.contains(day))
            .collect();

        let mut holidays: Vec<NaiveDate> = calendar.holidays.iter().copied().collect();
        holidays.sort();

        Self {
            working_days: working,
            holidays,
        }
    }
}

impl From<WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: WorkCalendar) -> Self {
        WorkCalendarConfig::from(&calendar)
    }
}

impl TryFrom<WorkCalendarConfig> for WorkCalendar {
    type Error = BoardError;

    fn try_from(config: WorkCalendarConfig) -> Result<Self, Self::Error> {
        WorkCalendar::from_config(&config)
    }
}
