use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .to_owned(),
            )
            .await?;

        // Create school_classes table
        manager
            .create_table(
                Table::create()
                    .table(SchoolClasses::Table)
                    .if_not_exists()
                    .col(pk_auto(SchoolClasses::Id))
                    .col(string(SchoolClasses::Name))
                    .to_owned(),
            )
            .await?;

        // Create sections table
        manager
            .create_table(
                Table::create()
                    .table(Sections::Table)
                    .if_not_exists()
                    .col(pk_auto(Sections::Id))
                    .col(integer(Sections::ClassId))
                    .col(string(Sections::Name))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_section_class")
                            .from(Sections::Table, Sections::ClassId)
                            .to(SchoolClasses::Table, SchoolClasses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create students table
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(pk_auto(Students::Id))
                    .col(string(Students::Name))
                    .col(string(Students::StudentCode).unique_key())
                    .col(integer(Students::ClassId))
                    .col(integer(Students::SectionId))
                    .col(decimal_len_null(Students::MonthlyFee, 10, 2))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_class")
                            .from(Students::Table, Students::ClassId)
                            .to(SchoolClasses::Table, SchoolClasses::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_section")
                            .from(Students::Table, Students::SectionId)
                            .to(Sections::Table, Sections::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sections::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SchoolClasses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Username,
}

#[derive(DeriveIden)]
enum SchoolClasses {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Sections {
    Table,
    Id,
    ClassId,
    Name,
}

#[derive(DeriveIden)]
pub(crate) enum Students {
    Table,
    Id,
    Name,
    StudentCode,
    ClassId,
    SectionId,
    MonthlyFee,
}
