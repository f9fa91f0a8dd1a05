//! SeaORM entities for the school fee ledger.
//!
//! Students, classes and sections belong to the roster and are read-only
//! from the ledger's point of view. Payments, their correction audit
//! trail, and the singleton bank balance are owned by the ledger.

pub mod bank_balance;
pub mod payment;
pub mod payment_correction;
pub mod school_class;
pub mod section;
pub mod student;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::bank_balance::Entity as BankBalance;
    pub use super::payment::Entity as Payment;
    pub use super::payment_correction::Entity as PaymentCorrection;
    pub use super::school_class::Entity as SchoolClass;
    pub use super::section::Entity as Section;
    pub use super::student::Entity as Student;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;

        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let admin = user::ActiveModel {
            username: Set("office".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let class_five = school_class::ActiveModel {
            name: Set("Class Five".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let section_a = section::ActiveModel {
            class_id: Set(class_five.id),
            name: Set("A".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let rahim = student::ActiveModel {
            name: Set("Rahim Uddin".to_string()),
            student_code: Set("MB-0001".to_string()),
            class_id: Set(class_five.id),
            section_id: Set(section_a.id),
            monthly_fee: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let karim = student::ActiveModel {
            name: Set("Karim Hasan".to_string()),
            student_code: Set("MB-0002".to_string()),
            class_id: Set(class_five.id),
            section_id: Set(section_a.id),
            monthly_fee: Set(Some(Decimal::new(60000, 2))),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let payment = payment::ActiveModel {
            student_id: Set(rahim.id),
            year: Set(2024),
            month: Set(3),
            payment_method: Set(payment::PaymentMethod::Bank),
            receipt: Set(Some("receipts/abc.png".to_string())),
            amount: Set(Decimal::new(40000, 2)),
            paid_by: Set(admin.id),
            notes: Set(Some("March fee".to_string())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        payment_correction::ActiveModel {
            payment_id: Set(payment.id),
            previous_receipt: Set(None),
            new_receipt: Set(Some("receipts/abc.png".to_string())),
            previous_notes: Set(None),
            new_notes: Set(Some("March fee".to_string())),
            reason: Set("Attached bank slip".to_string()),
            corrected_by: Set(admin.id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Roster
        let students = Student::find().all(&db).await?;
        assert_eq!(students.len(), 2);
        assert_eq!(rahim.effective_fee(Decimal::new(400, 0)), Decimal::new(400, 0));
        assert_eq!(karim.effective_fee(Decimal::new(400, 0)), Decimal::new(600, 0));

        // Relations
        let rahim_class = rahim.find_related(SchoolClass).one(&db).await?;
        assert_eq!(rahim_class.map(|c| c.name), Some("Class Five".to_string()));
        let rahim_section = rahim.find_related(Section).one(&db).await?;
        assert_eq!(rahim_section.map(|s| s.name), Some("A".to_string()));

        let stored = Payment::find()
            .filter(payment::Column::StudentId.eq(rahim.id))
            .filter(payment::Column::Year.eq(2024))
            .filter(payment::Column::Month.eq(3))
            .one(&db)
            .await?
            .expect("payment should exist");
        assert_eq!(stored.amount, Decimal::new(400, 0));
        assert_eq!(stored.payment_method, payment::PaymentMethod::Bank);

        let corrections = stored.find_related(PaymentCorrection).all(&db).await?;
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].reason, "Attached bank slip");

        // The migrations seed the singleton balance row
        let balance = BankBalance::find_by_id(bank_balance::SINGLETON_ID)
            .one(&db)
            .await?;
        assert!(balance.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_period_is_rejected_by_unique_index() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let admin = user::ActiveModel {
            username: Set("office".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        let class = school_class::ActiveModel {
            name: Set("Class One".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        let section = section::ActiveModel {
            class_id: Set(class.id),
            name: Set("B".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        let student = student::ActiveModel {
            name: Set("Nusrat Jahan".to_string()),
            student_code: Set("MB-0100".to_string()),
            class_id: Set(class.id),
            section_id: Set(section.id),
            monthly_fee: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let new_payment = || payment::ActiveModel {
            student_id: Set(student.id),
            year: Set(2024),
            month: Set(1),
            payment_method: Set(payment::PaymentMethod::Cash),
            receipt: Set(None),
            amount: Set(Decimal::new(400, 0)),
            paid_by: Set(admin.id),
            notes: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        new_payment().insert(&db).await?;
        let second = new_payment().insert(&db).await;
        assert!(second.is_err());

        let count = Payment::find().all(&db).await?.len();
        assert_eq!(count, 1);

        Ok(())
    }
}
