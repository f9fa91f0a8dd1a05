use sea_orm::entity::prelude::*;

/// An administrator account that can record payments.
/// Authentication itself is handled outside this service; the row only
/// exists so payments can be attributed to whoever recorded them.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    // Payments recorded by this administrator.
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
