//! Monthly Status Resolver.
//!
//! Status is derived on every query: a student is paid for a period when a
//! payment row exists for it, otherwise not paid. Nothing here writes.

use chrono::{DateTime, Utc};
use common::{MonthlyStatusReport, PaymentStats, PaymentStatus, Period, PeriodSummary, StudentPaymentRow};
use model::entities::payment;
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, instrument};

use crate::error::{LedgerError, Result};
use crate::period::validate_period;
use crate::roster::{self, RosterFilter, StudentRecord};
use crate::store;

/// Restricts the report to paid or unpaid students.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Paid,
    NotPaid,
}

impl StatusFilter {
    fn accepts(self, status: &PaymentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Paid => status.is_paid(),
            StatusFilter::NotPaid => !status.is_paid(),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = LedgerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "paid" => Ok(StatusFilter::Paid),
            "not_paid" | "unpaid" => Ok(StatusFilter::NotPaid),
            other => Err(LedgerError::Validation(format!(
                "unknown status filter '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusQuery {
    pub period: Period,
    pub roster: RosterFilter,
    pub status: StatusFilter,
}

impl StatusQuery {
    pub fn for_period(period: Period) -> Self {
        Self {
            period,
            roster: RosterFilter::default(),
            status: StatusFilter::All,
        }
    }
}

/// Payment timestamp as shown in status rows.
pub fn format_payment_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn status_of(payment: Option<&payment::Model>) -> PaymentStatus {
    match payment {
        Some(p) => PaymentStatus::Paid {
            payment_id: p.id,
            method: p.payment_method.as_str().to_string(),
            amount: p.amount,
            date: format_payment_date(p.created_at),
        },
        None => PaymentStatus::NotPaid,
    }
}

/// Joins the roster against the period's payments and computes the
/// statistics over the rows that end up in the report.
pub fn build_report(
    period: Period,
    students: Vec<StudentRecord>,
    payments: &[payment::Model],
    status: StatusFilter,
    default_fee: Decimal,
) -> MonthlyStatusReport {
    let by_student: HashMap<i32, &payment::Model> =
        payments.iter().map(|p| (p.student_id, p)).collect();

    let mut stats = PaymentStats::default();
    let mut rows = Vec::with_capacity(students.len());

    for record in students {
        let payment_details = status_of(by_student.get(&record.student.id).copied());
        if !status.accepts(&payment_details) {
            continue;
        }

        let monthly_fee = record.effective_fee(default_fee);
        stats.total_students += 1;
        if payment_details.is_paid() {
            stats.paid_count += 1;
            stats.total_amount += payment_details.paid_amount();
        } else {
            stats.pending_amount += monthly_fee;
        }

        rows.push(StudentPaymentRow {
            id: record.student.id,
            name: record.student.name,
            student_code: record.student.student_code,
            class_id: record.student.class_id,
            class_name: record.class_name,
            section_id: record.student.section_id,
            section_name: record.section_name,
            monthly_fee,
            payment_details,
        });
    }

    MonthlyStatusReport {
        year: period.year,
        month: period.month,
        students: rows,
        stats,
    }
}

#[instrument(skip(conn))]
pub async fn resolve_monthly_status<C: ConnectionTrait>(
    conn: &C,
    query: &StatusQuery,
    default_fee: Decimal,
) -> Result<MonthlyStatusReport> {
    let period = validate_period(query.period, Utc::now().date_naive())?;
    let students = roster::list_students(conn, &query.roster).await?;
    let payments = store::payments_for_period(conn, period).await?;

    let report = build_report(period, students, &payments, query.status, default_fee);
    debug!(
        "Status for {}: {}/{} paid, collected {}, pending {}",
        period,
        report.stats.paid_count,
        report.stats.total_students,
        report.stats.total_amount,
        report.stats.pending_amount
    );
    Ok(report)
}

/// Totals for the whole period regardless of any roster filter.
pub async fn period_summary<C: ConnectionTrait>(conn: &C, period: Period) -> Result<PeriodSummary> {
    let period = validate_period(period, Utc::now().date_naive())?;
    let (payment_count, total_amount) = store::period_totals(conn, period).await?;
    Ok(PeriodSummary {
        year: period.year,
        month: period.month,
        payment_count,
        total_amount,
    })
}
