use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

/// One quarter-hour reading in long format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Record {
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// kWh
    pub value: f64,
}

impl Record {
    /// `DD/MM/YYYY`
    pub fn date_label(&self) -> String {
        self.date.format("%d/%m/%Y").to_string()
    }

    /// `HH:MM:SS`
    pub fn time_label(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }
}

/// Inclusive calendar-date range rows must fall in to be transcribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

/// First and last year covered by `DateWindow::all_years`.
pub const ALL_YEARS: (i32, i32) = (2020, 2030);

impl DateWindow {
    /// `None` if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// 1 January to 31 December of `year`.
    pub fn for_year(year: i32) -> Option<Self> {
        Self::new(
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year, 12, 31)?,
        )
    }

    pub fn all_years() -> Self {
        let (first, last) = ALL_YEARS;
        Self {
            start: NaiveDate::from_ymd_opt(first, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(last, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
