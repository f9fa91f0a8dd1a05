use chrono::{Datelike, NaiveDate};
use common::Period;

use crate::error::{LedgerError, Result};

/// Earliest year a payment may be recorded for.
pub const MIN_YEAR: i32 = 1900;

/// Checks that `period` is a real calendar month no later than the
/// current year of `today`.
pub fn validate_period(period: Period, today: NaiveDate) -> Result<Period> {
    if !(1..=12).contains(&period.month) {
        return Err(LedgerError::Validation(format!(
            "month must be between 1 and 12, got {}",
            period.month
        )));
    }
    if period.year < MIN_YEAR || period.year > today.year() {
        return Err(LedgerError::Validation(format!(
            "year must be between {} and {}, got {}",
            MIN_YEAR,
            today.year(),
            period.year
        )));
    }
    Ok(period)
}

/// Builds a period from raw request values, defaulting each missing part
/// to the current year and month.
pub fn period_or_current(year: Option<i32>, month: Option<u32>, today: NaiveDate) -> Period {
    Period::new(
        year.unwrap_or_else(|| today.year()),
        month.unwrap_or_else(|| today.month()),
    )
}
