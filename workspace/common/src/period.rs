use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// A billing period: one calendar month of one year.
///
/// Construction does not validate; the ledger checks ranges before a
/// period reaches storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct Period {
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The month as stored in the `payments.month` column.
    pub fn month_i32(&self) -> i32 {
        self.month as i32
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_year_dash_month() {
        assert_eq!(Period::new(2024, 3).to_string(), "2024-03");
        assert_eq!(Period::new(2025, 12).to_string(), "2025-12");
    }

    #[test]
    fn orders_chronologically() {
        assert!(Period::new(2024, 12) < Period::new(2025, 1));
        assert!(Period::new(2025, 1) < Period::new(2025, 2));
    }
}
