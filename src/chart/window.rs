//! Date-range filters offered to chart callers

use chrono::{DateTime, Datelike, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Verification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "window")]
pub enum ChartWindow {
    /// Today and the `n` calendar days before it
    LastDays { days: i64 },
    Month { year: i32, month: u32 },
    All,
}

impl Default for ChartWindow {
    fn default() -> Self {
        ChartWindow::LastDays { days: 30 }
    }
}

impl ChartWindow {
    pub fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>, calendar: FixedOffset) -> bool {
        let day = at.with_timezone(&calendar).date_naive();
        match *self {
            ChartWindow::All => true,
            ChartWindow::LastDays { days } => {
                let today = now.with_timezone(&calendar).date_naive();
                day <= today && day >= today - Duration::days(days)
            }
            ChartWindow::Month { year, month } => day.year() == year && day.month() == month,
        }
    }

    /// Records inside the window; undated records only survive `All`
    pub fn filter(&self, records: &[Verification], now: DateTime<Utc>, calendar: FixedOffset) -> Vec<Verification> {
        records
            .iter()
            .filter(|v| match v.verified_at {
                Some(at) => self.contains(at, now, calendar),
                None => *self == ChartWindow::All,
            })
            .cloned()
            .collect()
    }
}
