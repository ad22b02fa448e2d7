//! Date/duration value types, cycle-date enumeration, and `when`-guard
//! evaluation.
//!
//! [Date] is an absolute instant at minute resolution; [Duration] is
//! restricted to whole months and years, which is what calendar-cycle
//! arithmetic (monthly/yearly re-runs) actually needs. Everything here is a
//! thin, serde-derived value type over [chrono], in the same spirit as
//! the rest of this crate's data model.

use crate::error::Error;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An absolute instant at minute resolution (ISO 8601, no timezone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Date(NaiveDateTime);

impl Date {
    /// Construct a [Date] from a year/month/day/hour/minute, truncating to
    /// minute resolution.
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Result<Self, Error> {
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| Error::BadDate(format!("{year}-{month:02}-{day:02}")))?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| Error::BadDate(format!("{hour:02}:{minute:02}")))?;
        Ok(Date(NaiveDateTime::new(date, time)))
    }

    fn from_naive(naive: NaiveDateTime) -> Self {
        // Minute resolution: drop sub-minute components.
        let truncated = naive
            .date()
            .and_hms_opt(naive.hour(), naive.minute(), 0)
            .unwrap_or(naive);
        Date(truncated)
    }

    /// Add a [Duration] to this date using calendar arithmetic: advance
    /// year/month, clamping the day to the target month's last day if the
    /// original day doesn't exist there. Minutes/hours are unaffected.
    pub fn checked_add(&self, duration: Duration) -> Option<Date> {
        shift_months(self.0, duration.months).map(Date)
    }

    /// Subtract a [Duration] from this date; symmetric with [Date::checked_add].
    pub fn checked_sub(&self, duration: Duration) -> Option<Date> {
        shift_months(self.0, -duration.months).map(Date)
    }

    /// Whether `self` falls in the half-open range `[start, stop)`.
    pub fn in_range(&self, start: &Date, stop: &Date) -> bool {
        self >= start && self < stop
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M"))
    }
}

impl FromStr for Date {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let formats = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d"];
        for fmt in formats {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Date::from_naive(naive));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Date::from_naive(date.and_hms_opt(0, 0, 0).unwrap()));
        }
        Err(Error::BadDate(s.to_string()))
    }
}

impl TryFrom<String> for Date {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Date> for String {
    fn from(date: Date) -> Self {
        date.to_string()
    }
}

impl JsonSchema for Date {
    fn schema_name() -> String {
        "Date".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// Advance (or, for a negative count, retreat) `naive` by `months` whole
/// calendar months, clamping the day-of-month to the target month's last
/// valid day when the original day overflows it (e.g. Jan 31 + P1M → Feb
/// 28/29, not Mar 3).
fn shift_months(naive: NaiveDateTime, months: i32) -> Option<NaiveDateTime> {
    let total = naive.year() * 12 + (naive.month() as i32 - 1) + months;
    let target_year = total.div_euclid(12);
    let target_month0 = total.rem_euclid(12);
    let target_month = (target_month0 + 1) as u32;

    let last_day = days_in_month(target_year, target_month);
    let day = naive.day().min(last_day);

    let date = NaiveDate::from_ymd_opt(target_year, target_month, day)?;
    Some(NaiveDateTime::new(date, naive.time()))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("month arithmetic stays within chrono's representable range");
    let first_of_this = NaiveDate::from_ymd_opt(year, month, 1)
        .expect("month arithmetic stays within chrono's representable range");
    (first_of_next - first_of_this).num_days() as u32
}

/// An ISO 8601 duration restricted to whole months and years (e.g. `P2M`,
/// `P1Y`, `-P6M`). Negative durations are permitted, used for lags into the
/// past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Duration {
    months: i32,
}

impl Duration {
    /// A duration of zero months — the "no cycling block" sentinel.
    pub const ZERO: Duration = Duration { months: 0 };

    /// Construct a duration from a whole number of months.
    pub fn from_months(months: i32) -> Self {
        Duration { months }
    }

    /// Construct a duration from a whole number of years.
    pub fn from_years(years: i32) -> Self {
        Duration { months: years * 12 }
    }

    /// Whether this duration is the zero duration.
    pub fn is_zero(&self) -> bool {
        self.months == 0
    }

    /// The signed month count.
    pub fn months(&self) -> i32 {
        self.months
    }
}

impl std::ops::Neg for Duration {
    type Output = Duration;

    fn neg(self) -> Duration {
        Duration {
            months: -self.months,
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.months < 0 { "-" } else { "" };
        let magnitude = self.months.unsigned_abs();
        if magnitude % 12 == 0 && magnitude != 0 {
            write!(f, "{sign}P{}Y", magnitude / 12)
        } else {
            write!(f, "{sign}P{magnitude}M")
        }
    }
}

impl FromStr for Duration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let rest = rest
            .strip_prefix('P')
            .ok_or_else(|| Error::BadDuration(s.to_string()))?;

        let (number, unit) = rest.split_at(rest.len().saturating_sub(1));
        let magnitude: i32 = number
            .parse()
            .map_err(|_| Error::BadDuration(s.to_string()))?;

        let months = match unit {
            "Y" => magnitude * 12,
            "M" => magnitude,
            _ => return Err(Error::BadDuration(s.to_string())),
        };

        Ok(Duration {
            months: if negative { -months } else { months },
        })
    }
}

impl TryFrom<String> for Duration {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Duration> for String {
    fn from(duration: Duration) -> Self {
        duration.to_string()
    }
}

impl JsonSchema for Duration {
    fn schema_name() -> String {
        "Duration".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// Generate the finite cycle-date sequence `d_0 = start, d_1 = d_0 +
/// period, …` stopping before exceeding `stop` (half-open). An empty
/// (zero) period — i.e. no cycling block — yields the single undated
/// cycle, represented as `[None]`.
pub fn cycle_dates(start: Date, stop: Date, period: Duration) -> Vec<Option<Date>> {
    if period.is_zero() {
        tracing::debug!("undated cycle: single iteration");
        return vec![None];
    }

    let mut dates = Vec::new();
    let mut current = start;
    while current < stop {
        dates.push(Some(current));
        match current.checked_add(period) {
            Some(next) => current = next,
            None => break,
        }
    }
    tracing::debug!(count = dates.len(), %period, "computed cycle date sequence");
    dates
}

/// A conjunction of optional date clauses gating whether a dependency edge
/// is materialized. All-absent passes unconditionally. Applied to an
/// undated cycle, any present clause fails — undated items are never
/// date-guarded in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct When {
    /// Passes iff the current cycle date equals this date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<Date>,
    /// Passes iff the current cycle date is strictly after this date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Date>,
    /// Passes iff the current cycle date is strictly before this date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Date>,
}

impl When {
    /// Evaluate the guard against the current cycle date (`None` for an
    /// undated cycle).
    pub fn evaluate(&self, current: Option<Date>) -> bool {
        match current {
            None => self.at.is_none() && self.after.is_none() && self.before.is_none(),
            Some(date) => {
                self.at.map_or(true, |at| date == at)
                    && self.after.map_or(true, |after| date > after)
                    && self.before.map_or(true, |before| date < before)
            }
        }
    }
}
