use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::Period;

/// Whether a student has paid for a period.
///
/// `NotPaid` is never stored; it is what the absence of a payment row
/// looks like once resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid {
        payment_id: i32,
        /// "cash", "bank" or "other"
        method: String,
        #[schema(value_type = String)]
        amount: Decimal,
        /// Payment timestamp formatted as `YYYY-MM-DD HH:MM:SS`
        date: String,
    },
    NotPaid,
}

impl PaymentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid { .. })
    }

    pub fn payment_id(&self) -> Option<i32> {
        match self {
            PaymentStatus::Paid { payment_id, .. } => Some(*payment_id),
            PaymentStatus::NotPaid => None,
        }
    }

    pub fn method(&self) -> Option<&str> {
        match self {
            PaymentStatus::Paid { method, .. } => Some(method),
            PaymentStatus::NotPaid => None,
        }
    }

    /// Amount actually recorded, zero when unpaid.
    pub fn paid_amount(&self) -> Decimal {
        match self {
            PaymentStatus::Paid { amount, .. } => *amount,
            PaymentStatus::NotPaid => Decimal::ZERO,
        }
    }
}

/// One roster entry with its payment status for the requested period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StudentPaymentRow {
    pub id: i32,
    pub name: String,
    pub student_code: String,
    pub class_id: i32,
    pub class_name: String,
    pub section_id: i32,
    pub section_name: String,
    /// The fee this student owes per period
    #[schema(value_type = String)]
    pub monthly_fee: Decimal,
    pub payment_details: PaymentStatus,
}

/// Aggregates over the rows of a [`MonthlyStatusReport`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct PaymentStats {
    pub total_students: usize,
    pub paid_count: usize,
    /// Sum of recorded payments for the listed students
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    /// Sum of the fees still owed by the listed unpaid students
    #[schema(value_type = String)]
    pub pending_amount: Decimal,
}

/// Read model answering "who has paid for this period".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyStatusReport {
    pub year: i32,
    pub month: u32,
    pub students: Vec<StudentPaymentRow>,
    pub stats: PaymentStats,
}

impl MonthlyStatusReport {
    pub fn period(&self) -> Period {
        Period::new(self.year, self.month)
    }
}

/// Whole-period totals, independent of any roster filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PeriodSummary {
    pub year: i32,
    pub month: u32,
    pub payment_count: u64,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
}

/// A stored payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentDto {
    pub id: i32,
    pub student_id: i32,
    pub year: i32,
    pub month: u32,
    pub payment_method: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub has_receipt: bool,
    pub paid_by: i32,
    pub notes: Option<String>,
    /// Always "paid"; unpaid periods have no payment record
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// The bank balance aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BankBalanceDto {
    #[schema(value_type = String)]
    pub balance: Decimal,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
