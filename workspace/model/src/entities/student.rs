use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{payment, school_class, section};

/// A student on the roster.
///
/// The roster is maintained by the student administration screens; the
/// payment ledger only ever reads it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Display name.
    pub name: String,
    /// The school-issued student code printed on receipts.
    #[sea_orm(unique)]
    pub student_code: String,
    pub class_id: i32,
    pub section_id: i32,
    /// Per-student monthly fee. `None` means the configured default applies.
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub monthly_fee: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "school_class::Entity",
        from = "Column::ClassId",
        to = "school_class::Column::Id",
        on_delete = "Restrict"
    )]
    SchoolClass,
    #[sea_orm(
        belongs_to = "section::Entity",
        from = "Column::SectionId",
        to = "section::Column::Id",
        on_delete = "Restrict"
    )]
    Section,
    #[sea_orm(has_many = "payment::Entity")]
    Payment,
}

impl Related<school_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolClass.def()
    }
}

impl Related<section::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Section.def()
    }
}

impl Related<payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl Model {
    /// The fee owed for one period, falling back to `default_fee` when the
    /// student has no override.
    pub fn effective_fee(&self, default_fee: Decimal) -> Decimal {
        self.monthly_fee.unwrap_or(default_fee)
    }
}

impl ActiveModelBehavior for ActiveModel {}
