use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Primary key of the single meaningful bank balance row.
pub const SINGLETON_ID: i32 = 1;

/// Running bank balance. Exactly one row (`SINGLETON_ID`) is used; it is
/// created by the migrations and only ever changed through an atomic
/// in-database increment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub balance: Decimal,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
