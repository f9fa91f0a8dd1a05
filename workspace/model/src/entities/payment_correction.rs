use sea_orm::entity::prelude::*;

use super::{payment, user};

/// Audit record written whenever an existing payment's notes or receipt
/// are changed. Amount, method and period never change after creation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_corrections")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub payment_id: i32,
    pub previous_receipt: Option<String>,
    pub new_receipt: Option<String>,
    pub previous_notes: Option<String>,
    pub new_notes: Option<String>,
    pub reason: String,
    pub corrected_by: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "payment::Entity",
        from = "Column::PaymentId",
        to = "payment::Column::Id",
        on_delete = "Cascade"
    )]
    Payment,
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::CorrectedBy",
        to = "user::Column::Id",
        on_delete = "Restrict"
    )]
    CorrectedBy,
}

impl Related<payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
