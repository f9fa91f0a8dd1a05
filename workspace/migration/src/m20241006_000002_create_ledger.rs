use sea_orm_migration::{prelude::*, schema::*};

use crate::m20241001_000001_create_roster::{Students, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Well-known id of the singleton bank balance row.
const BANK_BALANCE_ID: i32 = 1;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create payments table
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_auto(Payments::Id))
                    .col(integer(Payments::StudentId))
                    .col(integer(Payments::Year))
                    .col(integer(Payments::Month))
                    .col(string_len(Payments::PaymentMethod, 10))
                    .col(string_null(Payments::Receipt))
                    .col(decimal_len(Payments::Amount, 10, 2))
                    .col(integer(Payments::PaidBy))
                    .col(text_null(Payments::Notes))
                    .col(timestamp_with_time_zone(Payments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_student")
                            .from(Payments::Table, Payments::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_paid_by")
                            .from(Payments::Table, Payments::PaidBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One payment per student and period; concurrent writers for the
        // same period are rejected here rather than by a read-then-insert.
        manager
            .create_index(
                Index::create()
                    .name("idx_payments_student_period")
                    .table(Payments::Table)
                    .col(Payments::StudentId)
                    .col(Payments::Year)
                    .col(Payments::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_period")
                    .table(Payments::Table)
                    .col(Payments::Year)
                    .col(Payments::Month)
                    .to_owned(),
            )
            .await?;

        // Create payment_corrections table
        manager
            .create_table(
                Table::create()
                    .table(PaymentCorrections::Table)
                    .if_not_exists()
                    .col(pk_auto(PaymentCorrections::Id))
                    .col(integer(PaymentCorrections::PaymentId))
                    .col(string_null(PaymentCorrections::PreviousReceipt))
                    .col(string_null(PaymentCorrections::NewReceipt))
                    .col(text_null(PaymentCorrections::PreviousNotes))
                    .col(text_null(PaymentCorrections::NewNotes))
                    .col(text(PaymentCorrections::Reason))
                    .col(integer(PaymentCorrections::CorrectedBy))
                    .col(timestamp_with_time_zone(PaymentCorrections::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_correction_payment")
                            .from(PaymentCorrections::Table, PaymentCorrections::PaymentId)
                            .to(Payments::Table, Payments::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_correction_user")
                            .from(PaymentCorrections::Table, PaymentCorrections::CorrectedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create bank_balances table
        manager
            .create_table(
                Table::create()
                    .table(BankBalances::Table)
                    .if_not_exists()
                    .col(integer(BankBalances::Id).primary_key())
                    .col(decimal_len(BankBalances::Balance, 15, 2).default(0))
                    .col(
                        timestamp_with_time_zone(BankBalances::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Seed the singleton row so credits always have a target
        let seed = Query::insert()
            .into_table(BankBalances::Table)
            .columns([BankBalances::Id, BankBalances::Balance])
            .values_panic([BANK_BALANCE_ID.into(), 0.into()])
            .to_owned();
        manager.exec_stmt(seed).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BankBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentCorrections::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    StudentId,
    Year,
    Month,
    PaymentMethod,
    Receipt,
    Amount,
    PaidBy,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PaymentCorrections {
    Table,
    Id,
    PaymentId,
    PreviousReceipt,
    NewReceipt,
    PreviousNotes,
    NewNotes,
    Reason,
    CorrectedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BankBalances {
    Table,
    Id,
    Balance,
    UpdatedAt,
}
