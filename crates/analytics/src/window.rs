//! Aggregation windows.

use chrono::{DateTime, Duration, Months, Utc};
use domain::ParseValueError;

/// Time range an aggregate is computed over, ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyticsWindow {
    /// The last 7 days.
    Week,
    /// Since the same instant one calendar month ago.
    #[default]
    Month,
    /// The last 365 days.
    Year,
    /// Everything at or after an explicit instant.
    Since(DateTime<Utc>),
}

impl AnalyticsWindow {
    /// Returns the inclusive lower bound of the window relative to `now`.
    pub fn lower_bound(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            AnalyticsWindow::Week => now - Duration::days(7),
            AnalyticsWindow::Month => now
                .checked_sub_months(Months::new(1))
                .unwrap_or(now - Duration::days(30)),
            AnalyticsWindow::Year => now - Duration::days(365),
            AnalyticsWindow::Since(from) => *from,
        }
    }

    /// Returns the period name, `"custom"` for an explicit bound.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsWindow::Week => "week",
            AnalyticsWindow::Month => "month",
            AnalyticsWindow::Year => "year",
            AnalyticsWindow::Since(_) => "custom",
        }
    }
}

impl std::fmt::Display for AnalyticsWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AnalyticsWindow {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(AnalyticsWindow::Week),
            "month" => Ok(AnalyticsWindow::Month),
            "year" => Ok(AnalyticsWindow::Year),
            other => Err(ParseValueError::new("period", other)),
        }
    }
}
