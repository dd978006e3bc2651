use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::calendar::{WorkCalendar, WorkCalendarConfig};
use crate::error::{BoardError, BoardResult, StoreError};
use crate::position::KeySpace;
use crate::timeline::TimelineConfig;

pub const CONFIG_PATH_VAR: &str = "QUEUE_BOARD_CONFIG";
pub const DB_PATH_VAR: &str = "QUEUE_BOARD_DB";
pub const HTTP_ADDR_VAR: &str = "QUEUE_BOARD_HTTP_ADDR";
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";

/// Engine tunables. Every section falls back to its defaults when absent
/// from the JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub keys: KeySpace,
    pub timeline: TimelineConfig,
    /// Holidays and working weekdays for the axis. When unset the axis
    /// only honors `timeline.skip_weekends`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<WorkCalendarConfig>,
}

impl BoardConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> BoardResult<Self> {
        let file = File::open(path.as_ref()).map_err(StoreError::from)?;
        let config: BoardConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads from the file named by `QUEUE_BOARD_CONFIG`, or defaults.
    pub fn from_env() -> BoardResult<Self> {
        match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> BoardResult<()> {
        let keys = &self.keys;
        if !(keys.gap.is_finite() && keys.gap > 0.0) {
            return Err(BoardError::invalid("keys.gap must be a positive number"));
        }
        if !keys.initial.is_finite() {
            return Err(BoardError::invalid("keys.initial must be finite"));
        }
        if !(keys.min_gap > 0.0 && keys.min_gap < keys.gap / 2.0) {
            return Err(BoardError::invalid(
                "keys.min_gap must be positive and well below keys.gap",
            ));
        }
        if !(self.timeline.edge_margin >= 0.0) {
            return Err(BoardError::invalid(
                "timeline.edge_margin must not be negative",
            ));
        }
        if let Some(calendar) = &self.calendar {
            WorkCalendar::from_config(calendar)?;
        }
        Ok(())
    }

    /// The calendar the axis should follow for the given weekend setting.
    ///
    /// Holidays always apply. Skipping weekends removes Saturday and Sunday
    /// from the configured working days; keeping them adds both back.
    pub fn axis_calendar(&self, skip_weekends: bool) -> BoardResult<WorkCalendar> {
        let Some(config) = &self.calendar else {
            return Ok(WorkCalendar::for_skip_weekends(skip_weekends));
        };
        let weekend = [Weekday::Sat, Weekday::Sun];
        let mut days: Vec<Weekday> = config
            .working_days()
            .iter()
            .copied()
            .filter(|day| !weekend.contains(day))
            .collect();
        if !skip_weekends {
            days.extend(weekend);
        }
        let mut calendar = WorkCalendar::from_config(config)?;
        calendar.set_working_days(&days).map_err(|_| {
            BoardError::invalid("calendar has no working weekday when weekends are skipped")
        })?;
        Ok(calendar)
    }
}

pub fn http_addr_from_env() -> BoardResult<SocketAddr> {
    let raw = std::env::var(HTTP_ADDR_VAR).unwrap_or_else(|_| DEFAULT_HTTP_ADDR.to_string());
    raw.parse()
        .map_err(|err| BoardError::invalid(format!("{HTTP_ADDR_VAR}='{raw}': {err}")))
}

pub fn db_path_from_env() -> Option<PathBuf> {
    std::env::var_os(DB_PATH_VAR)
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}
