//! Time handling for monthly ocean series.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive range of calendar years covered by a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_year: i32,
    pub end_year: i32,
}

impl TimeRange {
    /// Create a new range. Years are swapped if given in reverse.
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year: start_year.min(end_year),
            end_year: start_year.max(end_year),
        }
    }

    /// Smallest range covering every date, or `None` for an empty slice.
    pub fn from_dates(dates: &[NaiveDate]) -> Option<Self> {
        let first = dates.iter().map(|d| d.year()).min()?;
        let last = dates.iter().map(|d| d.year()).max()?;
        Some(Self::new(first, last))
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        (self.start_year..=self.end_year).contains(&date.year())
    }

    /// `start_end` form used in artifact file names.
    pub fn file_label(&self) -> String {
        format!("{}_{}", self.start_year, self.end_year)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_year, self.end_year)
    }
}

/// One mid-month date per month for every year of `range`.
pub fn monthly_dates(range: TimeRange) -> Vec<NaiveDate> {
    (range.start_year..=range.end_year)
        .flat_map(|year| (1..=12).filter_map(move |month| NaiveDate::from_ymd_opt(year, month, 15)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_basics() {
        let range = TimeRange::new(2014, 1958);
        assert_eq!(range.start_year, 1958);
        assert_eq!(range.end_year, 2014);
        assert_eq!(range.file_label(), "1958_2014");
        assert_eq!(range.to_string(), "1958-2014");
        assert!(range.contains(&NaiveDate::from_ymd_opt(2000, 6, 1).unwrap()));
        assert!(!range.contains(&NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()));
    }

    #[test]
    fn test_monthly_dates() {
        let dates = monthly_dates(TimeRange::new(2000, 2002));
        assert_eq!(dates.len(), 36);
        assert_eq!(dates[0].month(), 1);
        assert_eq!(dates[35].month(), 12);
        assert_eq!(TimeRange::from_dates(&dates), Some(TimeRange::new(2000, 2002)));
        assert_eq!(TimeRange::from_dates(&[]), None);
    }
}
