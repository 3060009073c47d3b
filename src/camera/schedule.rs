// src/camera/schedule.rs
use chrono::{DateTime, Datelike, Local, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// A weekly window during which a camera runs recognition.
///
/// `start` is inclusive and `end` exclusive. A window whose end is not after
/// its start wraps past midnight into the following day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionWindow {
    pub day_of_week: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl DetectionWindow {
    pub fn contains(&self, at: &DateTime<Local>) -> bool {
        if !self.is_active {
            return false;
        }

        let day = at.weekday();
        let time = at.time();

        if self.start < self.end {
            day == self.day_of_week && time >= self.start && time < self.end
        } else {
            (day == self.day_of_week && time >= self.start)
                || (day == self.day_of_week.succ() && time < self.end)
        }
    }
}

/// Recognition is always on for a camera without active windows.
pub fn detection_enabled(windows: &[DetectionWindow], at: &DateTime<Local>) -> bool {
    if !windows.iter().any(|w| w.is_active) {
        return true;
    }
    windows.iter().any(|w| w.contains(at))
}
