//! Shared fixtures for the ledger tests.

use migration::{Migrator, MigratorTrait};
use model::entities::{school_class, section, student, user};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};

pub fn default_fee() -> Decimal {
    crate::default_monthly_fee()
}

pub async fn setup_db() -> DatabaseConnection {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ledger=debug")
        .with_test_writer()
        .try_init();

    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub struct Roster {
    pub admin_id: i32,
    pub class_five: i32,
    pub class_six: i32,
    pub section_five_a: i32,
    pub section_five_b: i32,
    pub section_six_a: i32,
    /// Rahim (5A), Karim (5A, fee 600), Fatema (5B), Nusrat (6A)
    pub students: Vec<student::Model>,
}

async fn add_class(db: &DatabaseConnection, name: &str) -> i32 {
    school_class::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert class")
    .id
}

async fn add_section(db: &DatabaseConnection, class_id: i32, name: &str) -> i32 {
    section::ActiveModel {
        class_id: Set(class_id),
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert section")
    .id
}

pub async fn add_student(
    db: &DatabaseConnection,
    name: &str,
    code: &str,
    class_id: i32,
    section_id: i32,
    monthly_fee: Option<Decimal>,
) -> student::Model {
    student::ActiveModel {
        name: Set(name.to_string()),
        student_code: Set(code.to_string()),
        class_id: Set(class_id),
        section_id: Set(section_id),
        monthly_fee: Set(monthly_fee),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert student")
}

pub async fn seed_roster(db: &DatabaseConnection) -> Roster {
    let admin_id = user::ActiveModel {
        username: Set("office".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
    .id;

    let class_five = add_class(db, "Class Five").await;
    let class_six = add_class(db, "Class Six").await;
    let section_five_a = add_section(db, class_five, "A").await;
    let section_five_b = add_section(db, class_five, "B").await;
    let section_six_a = add_section(db, class_six, "A").await;

    let students = vec![
        add_student(db, "Rahim Uddin", "MB-0001", class_five, section_five_a, None).await,
        add_student(
            db,
            "Karim Hossain",
            "MB-0002",
            class_five,
            section_five_a,
            Some(Decimal::new(600, 0)),
        )
        .await,
        add_student(db, "Fatema Begum", "MB-0003", class_five, section_five_b, None).await,
        add_student(db, "Nusrat Jahan", "MB-0004", class_six, section_six_a, None).await,
    ];

    Roster {
        admin_id,
        class_five,
        class_six,
        section_five_a,
        section_five_b,
        section_six_a,
        students,
    }
}

pub fn school() -> common::SchoolInfo {
    common::SchoolInfo {
        name: "Mousumi Biddyaniketan".to_string(),
        address: "Ukilpara, Naogaon".to_string(),
        logo: "/logo.png".to_string(),
        phone: "+880-XXX-XXXXXX".to_string(),
        email: "mbnbd@gmail.com".to_string(),
    }
}
