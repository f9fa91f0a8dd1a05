//! Ledger Store: durable payments keyed by `(student_id, year, month)` and
//! the singleton bank balance.
//!
//! Every function takes any [`ConnectionTrait`] so callers can run them on
//! the pool or inside a transaction.

use chrono::{DateTime, Utc};
use common::Period;
use model::entities::{bank_balance, payment, payment_correction};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{LedgerError, Result};

/// Fields of a payment about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub student_id: i32,
    pub period: Period,
    pub method: payment::PaymentMethod,
    pub receipt: Option<String>,
    pub amount: Decimal,
    pub paid_by: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Replacement values for a correction. `None` keeps the current value.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionChange {
    pub receipt: Option<String>,
    pub notes: Option<String>,
    pub reason: String,
    pub corrected_by: i32,
    pub at: DateTime<Utc>,
}

#[instrument(skip(conn))]
pub async fn find_payment<C: ConnectionTrait>(
    conn: &C,
    student_id: i32,
    period: Period,
) -> Result<Option<payment::Model>> {
    trace!("Looking up payment for student {} in {}", student_id, period);
    let found = payment::Entity::find()
        .filter(payment::Column::StudentId.eq(student_id))
        .filter(payment::Column::Year.eq(period.year))
        .filter(payment::Column::Month.eq(period.month_i32()))
        .one(conn)
        .await?;
    Ok(found)
}

pub async fn find_payment_by_id<C: ConnectionTrait>(
    conn: &C,
    payment_id: i32,
) -> Result<payment::Model> {
    payment::Entity::find_by_id(payment_id)
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::not_found("payment", payment_id))
}

/// Inserts a payment row. A second row for the same student and period is
/// refused by the unique index and reported as `ConstraintViolation`.
#[instrument(skip(conn, new), fields(student_id = new.student_id, period = %new.period))]
pub async fn create_payment<C: ConnectionTrait>(conn: &C, new: NewPayment) -> Result<payment::Model> {
    let (student_id, period) = (new.student_id, new.period);
    let row = payment::ActiveModel {
        student_id: Set(new.student_id),
        year: Set(new.period.year),
        month: Set(new.period.month_i32()),
        payment_method: Set(new.method),
        receipt: Set(new.receipt),
        amount: Set(new.amount),
        paid_by: Set(new.paid_by),
        notes: Set(new.notes),
        created_at: Set(new.created_at),
        ..Default::default()
    };

    let inserted = row
        .insert(conn)
        .await
        .map_err(|e| LedgerError::from_insert(e, student_id, period.year, period.month))?;
    debug!("Inserted payment {} for student {} in {}", inserted.id, student_id, period);
    Ok(inserted)
}

/// Adds `amount` to the singleton bank balance with a single
/// `balance = balance + amount` update, so concurrent credits never
/// overwrite each other.
#[instrument(skip(conn))]
pub async fn credit_bank_balance<C: ConnectionTrait>(conn: &C, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "bank credit must be positive, got {}",
            amount
        )));
    }

    let result = bank_balance::Entity::update_many()
        .col_expr(
            bank_balance::Column::Balance,
            Expr::col(bank_balance::Column::Balance).add(amount),
        )
        .col_expr(bank_balance::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(bank_balance::Column::Id.eq(bank_balance::SINGLETON_ID))
        .exec(conn)
        .await?;

    if result.rows_affected != 1 {
        warn!("Bank balance row {} is missing", bank_balance::SINGLETON_ID);
        return Err(LedgerError::not_found("bank balance", bank_balance::SINGLETON_ID));
    }
    Ok(())
}

pub async fn bank_balance<C: ConnectionTrait>(conn: &C) -> Result<bank_balance::Model> {
    bank_balance::Entity::find_by_id(bank_balance::SINGLETON_ID)
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::not_found("bank balance", bank_balance::SINGLETON_ID))
}

pub async fn payments_for_period<C: ConnectionTrait>(
    conn: &C,
    period: Period,
) -> Result<Vec<payment::Model>> {
    let payments = payment::Entity::find()
        .filter(payment::Column::Year.eq(period.year))
        .filter(payment::Column::Month.eq(period.month_i32()))
        .order_by_asc(payment::Column::Id)
        .all(conn)
        .await?;
    Ok(payments)
}

/// Number of payments and their total for the period, read in one statement.
pub async fn period_totals<C: ConnectionTrait>(conn: &C, period: Period) -> Result<(u64, Decimal)> {
    let (total, count) = payment::Entity::find()
        .select_only()
        .column_as(payment::Column::Amount.sum(), "total")
        .column_as(payment::Column::Id.count(), "count")
        .filter(payment::Column::Year.eq(period.year))
        .filter(payment::Column::Month.eq(period.month_i32()))
        .into_tuple::<(Option<Decimal>, i64)>()
        .one(conn)
        .await?
        .unwrap_or((None, 0));
    Ok((count.max(0) as u64, total.unwrap_or(Decimal::ZERO)))
}

/// Total amount recorded for the period across all students.
pub async fn sum_payments<C: ConnectionTrait>(conn: &C, period: Period) -> Result<Decimal> {
    let (_, total) = period_totals(conn, period).await?;
    Ok(total)
}

/// A student's payments, newest period first.
pub async fn payments_for_student<C: ConnectionTrait>(
    conn: &C,
    student_id: i32,
) -> Result<Vec<payment::Model>> {
    let payments = payment::Entity::find()
        .filter(payment::Column::StudentId.eq(student_id))
        .order_by_desc(payment::Column::Year)
        .order_by_desc(payment::Column::Month)
        .all(conn)
        .await?;
    Ok(payments)
}

pub async fn corrections_for_payment<C: ConnectionTrait>(
    conn: &C,
    payment_id: i32,
) -> Result<Vec<payment_correction::Model>> {
    let corrections = payment_correction::Entity::find()
        .filter(payment_correction::Column::PaymentId.eq(payment_id))
        .order_by_asc(payment_correction::Column::Id)
        .all(conn)
        .await?;
    Ok(corrections)
}

/// Writes a payment and, for bank payments, the matching balance credit in
/// one transaction. Either both land or neither does.
#[instrument(skip(db, new), fields(student_id = new.student_id, period = %new.period, method = %new.method))]
pub async fn commit_payment(db: &DatabaseConnection, new: NewPayment) -> Result<payment::Model> {
    let txn = db.begin().await?;

    let method = new.method;
    let inserted = create_payment(&txn, new).await?;
    if method == payment::PaymentMethod::Bank {
        credit_bank_balance(&txn, inserted.amount).await?;
        debug!("Credited {} to bank balance", inserted.amount);
    }

    txn.commit().await?;
    info!(
        "Payment {} committed for student {} ({}-{:02})",
        inserted.id, inserted.student_id, inserted.year, inserted.month
    );
    Ok(inserted)
}

/// Applies a correction to an existing payment together with its audit
/// row. Returns the updated payment and the audit entry.
#[instrument(skip(db, change))]
pub async fn apply_correction(
    db: &DatabaseConnection,
    payment_id: i32,
    change: CorrectionChange,
) -> Result<(payment::Model, payment_correction::Model)> {
    let txn = db.begin().await?;

    let existing = find_payment_by_id(&txn, payment_id).await?;
    let previous_receipt = existing.receipt.clone();
    let previous_notes = existing.notes.clone();

    let mut updated: payment::ActiveModel = existing.into();
    if let Some(receipt) = &change.receipt {
        updated.receipt = Set(Some(receipt.clone()));
    }
    if let Some(notes) = &change.notes {
        updated.notes = Set(Some(notes.clone()));
    }
    let updated = updated.update(&txn).await?;

    let audit = payment_correction::ActiveModel {
        payment_id: Set(payment_id),
        previous_receipt: Set(previous_receipt),
        new_receipt: Set(updated.receipt.clone()),
        previous_notes: Set(previous_notes),
        new_notes: Set(updated.notes.clone()),
        reason: Set(change.reason),
        corrected_by: Set(change.corrected_by),
        created_at: Set(change.at),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!("Payment {} corrected (audit entry {})", payment_id, audit.id);
    Ok((updated, audit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_roster, setup_db};

    fn new_payment(student_id: i32, paid_by: i32, method: payment::PaymentMethod) -> NewPayment {
        NewPayment {
            student_id,
            period: Period::new(2024, 3),
            method,
            receipt: None,
            amount: Decimal::new(400, 0),
            paid_by,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_then_find_by_period() {
        let db = setup_db().await;
        let roster = seed_roster(&db).await;
        let student = roster.students[0].id;

        assert!(find_payment(&db, student, Period::new(2024, 3)).await.unwrap().is_none());

        let created = create_payment(&db, new_payment(student, roster.admin_id, payment::PaymentMethod::Cash))
            .await
            .unwrap();
        let found = find_payment(&db, student, Period::new(2024, 3))
            .await
            .unwrap()
            .expect("payment should be found");
        assert_eq!(found.id, created.id);
        assert_eq!(found.amount, Decimal::new(400, 0));

        // other periods stay unpaid
        assert!(find_payment(&db, student, Period::new(2024, 4)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_period_is_a_constraint_violation() {
        let db = setup_db().await;
        let roster = seed_roster(&db).await;
        let student = roster.students[0].id;

        create_payment(&db, new_payment(student, roster.admin_id, payment::PaymentMethod::Cash))
            .await
            .unwrap();
        let err = create_payment(&db, new_payment(student, roster.admin_id, payment::PaymentMethod::Cash))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::ConstraintViolation { student_id, year: 2024, month: 3 } if student_id == student
        ));
    }

    #[tokio::test]
    async fn credits_accumulate_on_the_singleton() {
        let db = setup_db().await;
        let before = bank_balance(&db).await.unwrap().balance;

        credit_bank_balance(&db, Decimal::new(400, 0)).await.unwrap();
        credit_bank_balance(&db, Decimal::new(25050, 2)).await.unwrap();

        let after = bank_balance(&db).await.unwrap().balance;
        assert_eq!(after - before, Decimal::new(65050, 2));
    }

    #[tokio::test]
    async fn non_positive_credit_is_rejected() {
        let db = setup_db().await;
        assert!(matches!(
            credit_bank_balance(&db, Decimal::ZERO).await,
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            credit_bank_balance(&db, Decimal::new(-1, 0)).await,
            Err(LedgerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn commit_payment_credits_only_bank_payments() {
        let db = setup_db().await;
        let roster = seed_roster(&db).await;
        let before = bank_balance(&db).await.unwrap().balance;

        commit_payment(&db, new_payment(roster.students[0].id, roster.admin_id, payment::PaymentMethod::Cash))
            .await
            .unwrap();
        assert_eq!(bank_balance(&db).await.unwrap().balance, before);

        commit_payment(&db, new_payment(roster.students[1].id, roster.admin_id, payment::PaymentMethod::Bank))
            .await
            .unwrap();
        assert_eq!(bank_balance(&db).await.unwrap().balance - before, Decimal::new(400, 0));
    }

    #[tokio::test]
    async fn failed_commit_leaves_balance_untouched() {
        let db = setup_db().await;
        let roster = seed_roster(&db).await;
        let student = roster.students[0].id;

        commit_payment(&db, new_payment(student, roster.admin_id, payment::PaymentMethod::Bank))
            .await
            .unwrap();
        let after_first = bank_balance(&db).await.unwrap().balance;

        let err = commit_payment(&db, new_payment(student, roster.admin_id, payment::PaymentMethod::Bank))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ConstraintViolation { .. }));
        assert_eq!(bank_balance(&db).await.unwrap().balance, after_first);
    }

    #[tokio::test]
    async fn sum_covers_whole_period_only() {
        let db = setup_db().await;
        let roster = seed_roster(&db).await;

        for student in &roster.students[..3] {
            create_payment(&db, new_payment(student.id, roster.admin_id, payment::PaymentMethod::Cash))
                .await
                .unwrap();
        }
        let mut april = new_payment(roster.students[0].id, roster.admin_id, payment::PaymentMethod::Cash);
        april.period = Period::new(2024, 4);
        create_payment(&db, april).await.unwrap();

        assert_eq!(sum_payments(&db, Period::new(2024, 3)).await.unwrap(), Decimal::new(1200, 0));
        assert_eq!(sum_payments(&db, Period::new(2024, 4)).await.unwrap(), Decimal::new(400, 0));
        assert_eq!(sum_payments(&db, Period::new(2024, 5)).await.unwrap(), Decimal::ZERO);

        assert_eq!(
            period_totals(&db, Period::new(2024, 3)).await.unwrap(),
            (3, Decimal::new(1200, 0))
        );
        assert_eq!(
            period_totals(&db, Period::new(2024, 5)).await.unwrap(),
            (0, Decimal::ZERO)
        );
    }

    #[tokio::test]
    async fn student_history_is_newest_first() {
        let db = setup_db().await;
        let roster = seed_roster(&db).await;
        let student = roster.students[0].id;

        for (year, month) in [(2023, 12), (2024, 2), (2024, 1)] {
            let mut p = new_payment(student, roster.admin_id, payment::PaymentMethod::Cash);
            p.period = Period::new(year, month);
            create_payment(&db, p).await.unwrap();
        }

        let history: Vec<(i32, i32)> = payments_for_student(&db, student)
            .await
            .unwrap()
            .iter()
            .map(|p| (p.year, p.month))
            .collect();
        assert_eq!(history, vec![(2024, 2), (2024, 1), (2023, 12)]);
    }

    #[tokio::test]
    async fn correction_updates_fields_and_records_audit() {
        let db = setup_db().await;
        let roster = seed_roster(&db).await;
        let created = create_payment(&db, new_payment(roster.students[0].id, roster.admin_id, payment::PaymentMethod::Cash))
            .await
            .unwrap();

        let (updated, audit) = apply_correction(
            &db,
            created.id,
            CorrectionChange {
                receipt: Some("receipts/late.png".to_string()),
                notes: None,
                reason: "Slip brought in later".to_string(),
                corrected_by: roster.admin_id,
                at: Utc::now(),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.receipt.as_deref(), Some("receipts/late.png"));
        assert_eq!(updated.amount, created.amount);
        assert_eq!(audit.previous_receipt, None);
        assert_eq!(audit.new_receipt.as_deref(), Some("receipts/late.png"));

        let trail = corrections_for_payment(&db, created.id).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].reason, "Slip brought in later");
    }

    #[tokio::test]
    async fn correcting_unknown_payment_is_not_found() {
        let db = setup_db().await;
        let roster = seed_roster(&db).await;
        let result = apply_correction(
            &db,
            9999,
            CorrectionChange {
                receipt: None,
                notes: Some("x".to_string()),
                reason: "typo".to_string(),
                corrected_by: roster.admin_id,
                at: Utc::now(),
            },
        )
        .await;
        assert!(matches!(result, Err(LedgerError::NotFound { entity: "payment", .. })));
    }
}
