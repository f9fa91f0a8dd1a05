//! Payment Recorder: validates a payment request and commits it to the
//! ledger together with its proof file.

use chrono::Utc;
use common::Period;
use model::entities::{payment, payment_correction};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{LedgerError, Result};
use crate::period::validate_period;
use crate::roster;
use crate::storage::{FileStorage, RECEIPTS_DIR, UploadedFile};
use crate::store::{self, CorrectionChange, NewPayment};

/// Request to record one student's payment for one period.
#[derive(Debug, Clone)]
pub struct RecordPayment {
    pub student_id: i32,
    pub period: Period,
    pub method: payment::PaymentMethod,
    pub proof: Option<UploadedFile>,
    pub notes: Option<String>,
    pub actor_id: i32,
}

/// Request to amend the notes or proof of an existing payment.
#[derive(Debug, Clone)]
pub struct CorrectPayment {
    pub payment_id: i32,
    pub notes: Option<String>,
    pub proof: Option<UploadedFile>,
    pub reason: String,
    pub actor_id: i32,
}

fn non_empty(file: Option<UploadedFile>) -> Option<UploadedFile> {
    file.filter(|f| !f.bytes.is_empty())
}

fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct PaymentRecorder {
    db: DatabaseConnection,
    storage: Arc<dyn FileStorage>,
    default_fee: Decimal,
}

impl PaymentRecorder {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn FileStorage>, default_fee: Decimal) -> Self {
        Self {
            db,
            storage,
            default_fee,
        }
    }

    pub fn default_fee(&self) -> Decimal {
        self.default_fee
    }

    /// Records a payment. A period can be paid only once; a second attempt
    /// fails with `ConstraintViolation` and changes nothing.
    ///
    /// The proof is stored before the database transaction. If the
    /// transaction fails the stored file is removed again.
    #[instrument(
        skip(self, request),
        fields(student_id = request.student_id, period = %request.period, method = %request.method)
    )]
    pub async fn record_payment(&self, request: RecordPayment) -> Result<payment::Model> {
        let period = validate_period(request.period, Utc::now().date_naive())?;
        let student = roster::get_student(&self.db, request.student_id).await?;

        let proof = non_empty(request.proof);
        if request.method.requires_proof() && proof.is_none() {
            warn!("Rejected {} payment without proof", request.method);
            return Err(LedgerError::Validation(format!(
                "payment proof is required for {} payments",
                request.method
            )));
        }

        let amount = student.effective_fee(self.default_fee);
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "monthly fee for student {} must be positive, got {}",
                student.id, amount
            )));
        }

        // Fast rejection; the unique index is what actually guarantees it.
        if store::find_payment(&self.db, student.id, period).await?.is_some() {
            warn!("Payment already recorded for student {} in {}", student.id, period);
            return Err(LedgerError::ConstraintViolation {
                student_id: student.id,
                year: period.year,
                month: period.month,
            });
        }

        let receipt = match &proof {
            Some(file) => Some(self.storage.store(file, RECEIPTS_DIR).await?),
            None => None,
        };

        let new = NewPayment {
            student_id: student.id,
            period,
            method: request.method,
            receipt: receipt.clone(),
            amount,
            paid_by: request.actor_id,
            notes: clean_text(request.notes),
            created_at: Utc::now(),
        };

        match store::commit_payment(&self.db, new).await {
            Ok(recorded) => {
                info!(
                    "Recorded {} payment {} of {} for student {} in {}",
                    recorded.payment_method, recorded.id, recorded.amount, student.id, period
                );
                Ok(recorded)
            }
            Err(err) => {
                error!(
                    "record_payment failed for student {} in {}: {}",
                    student.id, period, err
                );
                if let Some(reference) = receipt {
                    self.discard(&reference).await;
                }
                Err(err)
            }
        }
    }

    /// Replaces the notes and/or proof of a payment and writes an audit
    /// entry. Amount, method and period never change.
    #[instrument(skip(self, request), fields(payment_id = request.payment_id))]
    pub async fn correct_payment(
        &self,
        request: CorrectPayment,
    ) -> Result<(payment::Model, payment_correction::Model)> {
        let reason = request.reason.trim().to_string();
        if reason.is_empty() {
            return Err(LedgerError::Validation(
                "a reason is required to correct a payment".to_string(),
            ));
        }

        let notes = clean_text(request.notes);
        let proof = non_empty(request.proof);
        if notes.is_none() && proof.is_none() {
            return Err(LedgerError::Validation(
                "a correction must change the notes or attach a proof".to_string(),
            ));
        }

        let existing = store::find_payment_by_id(&self.db, request.payment_id).await?;
        debug!(
            "Correcting payment {} for student {} ({}-{:02})",
            existing.id, existing.student_id, existing.year, existing.month
        );

        let receipt = match &proof {
            Some(file) => Some(self.storage.store(file, RECEIPTS_DIR).await?),
            None => None,
        };

        let change = CorrectionChange {
            receipt: receipt.clone(),
            notes,
            reason,
            corrected_by: request.actor_id,
            at: Utc::now(),
        };

        match store::apply_correction(&self.db, existing.id, change).await {
            Ok(result) => Ok(result),
            Err(err) => {
                error!("correct_payment failed for payment {}: {}", existing.id, err);
                if let Some(reference) = receipt {
                    self.discard(&reference).await;
                }
                Err(err)
            }
        }
    }

    async fn discard(&self, reference: &str) {
        match self.storage.delete(reference).await {
            Ok(()) => debug!("Removed orphaned file {}", reference),
            Err(e) => error!("Failed to remove orphaned file {}: {}", reference, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryFileStorage;
    use crate::testing::{default_fee, seed_roster, setup_db};
    use async_trait::async_trait;
    use model::entities::payment::PaymentMethod;
    use sea_orm::{EntityTrait, PaginatorTrait};

    struct Fixture {
        db: DatabaseConnection,
        storage: Arc<InMemoryFileStorage>,
        recorder: Arc<PaymentRecorder>,
        roster: crate::testing::Roster,
    }

    async fn fixture() -> Fixture {
        let db = setup_db().await;
        let roster = seed_roster(&db).await;
        let storage = Arc::new(InMemoryFileStorage::new());
        let recorder = Arc::new(PaymentRecorder::new(db.clone(), storage.clone(), default_fee()));
        Fixture {
            db,
            storage,
            recorder,
            roster,
        }
    }

    fn request(student_id: i32, actor_id: i32, method: PaymentMethod) -> RecordPayment {
        let proof = match method {
            PaymentMethod::Cash => None,
            _ => Some(UploadedFile::new("slip.png", b"png".to_vec())),
        };
        RecordPayment {
            student_id,
            period: Period::new(2024, 3),
            method,
            proof,
            notes: Some("  March fee ".to_string()),
            actor_id,
        }
    }

    async fn balance(db: &DatabaseConnection) -> Decimal {
        store::bank_balance(db).await.unwrap().balance
    }

    #[tokio::test]
    async fn cash_payment_uses_default_fee_and_is_findable() {
        let f = fixture().await;
        let student = f.roster.students[0].id;
        let before = balance(&f.db).await;

        let recorded = f
            .recorder
            .record_payment(request(student, f.roster.admin_id, PaymentMethod::Cash))
            .await
            .unwrap();

        assert_eq!(recorded.amount, Decimal::new(400, 0));
        assert_eq!(recorded.notes.as_deref(), Some("March fee"));
        assert_eq!(recorded.paid_by, f.roster.admin_id);
        assert!(recorded.receipt.is_none());

        let found = store::find_payment(&f.db, student, Period::new(2024, 3))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, recorded.id);
        assert_eq!(balance(&f.db).await, before);
    }

    #[tokio::test]
    async fn bank_payment_credits_exact_amount() {
        let f = fixture().await;
        let before = balance(&f.db).await;

        let recorded = f
            .recorder
            .record_payment(request(f.roster.students[0].id, f.roster.admin_id, PaymentMethod::Bank))
            .await
            .unwrap();

        assert_eq!(recorded.amount, Decimal::new(400, 0));
        assert_eq!(balance(&f.db).await - before, Decimal::new(400, 0));
        let reference = recorded.receipt.expect("bank payment keeps its proof");
        assert!(f.storage.exists(&reference).await.unwrap());
    }

    #[tokio::test]
    async fn custom_fee_is_charged() {
        let f = fixture().await;
        let karim = f.roster.students[1].id;

        let recorded = f
            .recorder
            .record_payment(request(karim, f.roster.admin_id, PaymentMethod::Other))
            .await
            .unwrap();
        assert_eq!(recorded.amount, Decimal::new(600, 0));
        assert_eq!(recorded.payment_method, PaymentMethod::Other);
    }

    #[tokio::test]
    async fn second_recording_is_rejected_without_side_effects() {
        let f = fixture().await;
        let student = f.roster.students[0].id;

        f.recorder
            .record_payment(request(student, f.roster.admin_id, PaymentMethod::Bank))
            .await
            .unwrap();
        let balance_after_first = balance(&f.db).await;
        let files_after_first = f.storage.len().await;

        let err = f
            .recorder
            .record_payment(request(student, f.roster.admin_id, PaymentMethod::Bank))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::ConstraintViolation { month: 3, .. }));
        assert_eq!(balance(&f.db).await, balance_after_first);
        assert_eq!(f.storage.len().await, files_after_first);
        assert_eq!(model::entities::payment::Entity::find().count(&f.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_recordings_produce_one_payment() {
        let f = fixture().await;
        let student = f.roster.students[0].id;
        let before = balance(&f.db).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let recorder = f.recorder.clone();
                let req = request(student, f.roster.admin_id, PaymentMethod::Bank);
                tokio::spawn(async move { recorder.record_payment(req).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(LedgerError::ConstraintViolation { .. }) => {}
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(model::entities::payment::Entity::find().count(&f.db).await.unwrap(), 1);
        assert_eq!(balance(&f.db).await - before, Decimal::new(400, 0));
        assert_eq!(f.storage.len().await, 1);
    }

    #[tokio::test]
    async fn proof_required_for_bank_and_other() {
        let f = fixture().await;
        for method in [PaymentMethod::Bank, PaymentMethod::Other] {
            let mut req = request(f.roster.students[0].id, f.roster.admin_id, method);
            req.proof = None;
            assert!(matches!(
                f.recorder.record_payment(req).await,
                Err(LedgerError::Validation(_))
            ));
        }

        // an empty upload counts as no proof
        let mut req = request(f.roster.students[0].id, f.roster.admin_id, PaymentMethod::Bank);
        req.proof = Some(UploadedFile::new("empty.png", Vec::new()));
        assert!(matches!(
            f.recorder.record_payment(req).await,
            Err(LedgerError::Validation(_))
        ));
        assert!(f.storage.is_empty().await);
    }

    #[tokio::test]
    async fn invalid_period_and_unknown_student() {
        let f = fixture().await;

        let mut bad_month = request(f.roster.students[0].id, f.roster.admin_id, PaymentMethod::Cash);
        bad_month.period = Period::new(2024, 13);
        assert!(matches!(
            f.recorder.record_payment(bad_month).await,
            Err(LedgerError::Validation(_))
        ));

        let mut too_old = request(f.roster.students[0].id, f.roster.admin_id, PaymentMethod::Cash);
        too_old.period = Period::new(1899, 1);
        assert!(matches!(
            f.recorder.record_payment(too_old).await,
            Err(LedgerError::Validation(_))
        ));

        let unknown = request(9999, f.roster.admin_id, PaymentMethod::Cash);
        assert!(matches!(
            f.recorder.record_payment(unknown).await,
            Err(LedgerError::NotFound { entity: "student", .. })
        ));
    }

    struct FailingStorage;

    #[async_trait]
    impl FileStorage for FailingStorage {
        async fn store(&self, _file: &UploadedFile, _hint: &str) -> Result<String> {
            Err(LedgerError::Storage("disk full".to_string()))
        }
        async fn exists(&self, _reference: &str) -> Result<bool> {
            Ok(false)
        }
        async fn download(&self, reference: &str) -> Result<Vec<u8>> {
            Err(LedgerError::Storage(format!("no file {}", reference)))
        }
        async fn delete(&self, _reference: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn storage_failure_leaves_no_payment() {
        let db = setup_db().await;
        let roster = seed_roster(&db).await;
        let recorder = PaymentRecorder::new(db.clone(), Arc::new(FailingStorage), default_fee());
        let before = balance(&db).await;

        let err = recorder
            .record_payment(request(roster.students[0].id, roster.admin_id, PaymentMethod::Bank))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Storage(_)));
        assert_eq!(model::entities::payment::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(balance(&db).await, before);
    }

    #[tokio::test]
    async fn correction_attaches_proof_and_audits() {
        let f = fixture().await;
        let recorded = f
            .recorder
            .record_payment(request(f.roster.students[0].id, f.roster.admin_id, PaymentMethod::Cash))
            .await
            .unwrap();
        let before = balance(&f.db).await;

        let (updated, audit) = f
            .recorder
            .correct_payment(CorrectPayment {
                payment_id: recorded.id,
                notes: None,
                proof: Some(UploadedFile::new("late.jpg", b"jpg".to_vec())),
                reason: "Parent brought the slip".to_string(),
                actor_id: f.roster.admin_id,
            })
            .await
            .unwrap();

        assert_eq!(updated.amount, recorded.amount);
        assert_eq!(updated.payment_method, recorded.payment_method);
        assert_eq!(updated.notes, recorded.notes);
        let reference = updated.receipt.clone().unwrap();
        assert!(reference.ends_with(".jpg"));
        assert!(f.storage.exists(&reference).await.unwrap());
        assert_eq!(audit.previous_receipt, None);
        assert_eq!(audit.corrected_by, f.roster.admin_id);
        assert_eq!(balance(&f.db).await, before);
    }

    #[tokio::test]
    async fn correction_needs_reason_and_change() {
        let f = fixture().await;
        let recorded = f
            .recorder
            .record_payment(request(f.roster.students[0].id, f.roster.admin_id, PaymentMethod::Cash))
            .await
            .unwrap();

        let no_reason = CorrectPayment {
            payment_id: recorded.id,
            notes: Some("fixed".to_string()),
            proof: None,
            reason: "  ".to_string(),
            actor_id: f.roster.admin_id,
        };
        assert!(matches!(
            f.recorder.correct_payment(no_reason).await,
            Err(LedgerError::Validation(_))
        ));

        let no_change = CorrectPayment {
            payment_id: recorded.id,
            notes: None,
            proof: None,
            reason: "nothing".to_string(),
            actor_id: f.roster.admin_id,
        };
        assert!(matches!(
            f.recorder.correct_payment(no_change).await,
            Err(LedgerError::Validation(_))
        ));

        let missing = CorrectPayment {
            payment_id: 9999,
            notes: Some("fixed".to_string()),
            proof: None,
            reason: "typo".to_string(),
            actor_id: f.roster.admin_id,
        };
        assert!(matches!(
            f.recorder.correct_payment(missing).await,
            Err(LedgerError::NotFound { .. })
        ));
    }
}
