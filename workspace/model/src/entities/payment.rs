use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use std::fmt;
use std::str::FromStr;

use super::{payment_correction, student, user};

/// How a fee was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "bank")]
    Bank,
    #[sea_orm(string_value = "other")]
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Bank => "bank",
            PaymentMethod::Other => "other",
        }
    }

    /// Whether a proof-of-payment file must accompany this method.
    pub fn requires_proof(&self) -> bool {
        !matches!(self, PaymentMethod::Cash)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "bank" => Ok(PaymentMethod::Bank),
            "other" => Ok(PaymentMethod::Other),
            other => Err(format!(
                "Invalid payment method '{}'. Valid values: cash, bank, other",
                other
            )),
        }
    }
}

/// A fee payment for one student and one billing period.
///
/// There is no status column: a row existing for `(student_id, year, month)`
/// means the period is paid, absence means it is not. The migration puts a
/// unique index on that triple.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub student_id: i32,
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: i32,
    pub payment_method: PaymentMethod,
    /// Opaque reference into file storage for the uploaded proof.
    pub receipt: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub amount: Decimal,
    /// The administrator who recorded the payment.
    pub paid_by: i32,
    pub notes: Option<String>,
    /// Doubles as the payment date.
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "student::Entity",
        from = "Column::StudentId",
        to = "student::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::PaidBy",
        to = "user::Column::Id",
        on_delete = "Restrict"
    )]
    PaidBy,
    #[sea_orm(has_many = "payment_correction::Entity")]
    Correction,
}

impl Related<student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaidBy.def()
    }
}

impl Related<payment_correction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Correction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
