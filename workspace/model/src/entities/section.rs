use sea_orm::entity::prelude::*;

use super::school_class;

/// A section within a class ("A", "B", ...).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sections")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub class_id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "school_class::Entity",
        from = "Column::ClassId",
        to = "school_class::Column::Id",
        on_delete = "Cascade"
    )]
    SchoolClass,
    #[sea_orm(has_many = "super::student::Entity")]
    Student,
}

impl Related<school_class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolClass.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
