use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Employee {
    Table,
    Id,
    Name,
    Alias,
    Manager,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Charge {
    Table,
    Id,
    EmployeeId,
    ExpenseReportId,
    ExpenseDate,
    Merchant,
    Location,
    BilledAmountCents,
    TransactionAmountCents,
    Description,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExpenseReport {
    Table,
    Id,
    EmployeeId,
    Status,
    AmountCents,
    CostCenter,
    Notes,
    Approver,
    DateSubmitted,
    DateResolved,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Extensions (safe if already present)
        manager
            .get_connection()
            .execute_unprepared(r#"CREATE EXTENSION IF NOT EXISTS "pgcrypto";"#)
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Employee::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employee::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(Employee::Name).string_len(50).not_null())
                    .col(ColumnDef::new(Employee::Alias).string_len(25).not_null())
                    .col(ColumnDef::new(Employee::Manager).string_len(25).not_null())
                    .col(
                        ColumnDef::new(Employee::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .col(
                        ColumnDef::new(Employee::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_employee_alias")
                    .table(Employee::Table)
                    .col(Employee::Alias)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExpenseReport::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseReport::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(ExpenseReport::EmployeeId).uuid().not_null())
                    .col(
                        ColumnDef::new(ExpenseReport::Status)
                            .string_len(32)
                            .not_null()
                            .default("SAVED"),
                    )
                    .col(
                        ColumnDef::new(ExpenseReport::AmountCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ExpenseReport::CostCenter)
                            .integer()
                            .not_null()
                            .default(1055),
                    )
                    .col(ColumnDef::new(ExpenseReport::Notes).string_len(250).not_null())
                    .col(
                        ColumnDef::new(ExpenseReport::Approver)
                            .string_len(25)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExpenseReport::DateSubmitted).date())
                    .col(ColumnDef::new(ExpenseReport::DateResolved).date())
                    .col(
                        ColumnDef::new(ExpenseReport::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .col(
                        ColumnDef::new(ExpenseReport::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_report_employee")
                            .from(ExpenseReport::Table, ExpenseReport::EmployeeId)
                            .to(Employee::Table, Employee::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expense_report_employee")
                    .table(ExpenseReport::Table)
                    .col(ExpenseReport::EmployeeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expense_report_status")
                    .table(ExpenseReport::Table)
                    .col(ExpenseReport::EmployeeId)
                    .col(ExpenseReport::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Charge::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Charge::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(Charge::EmployeeId).uuid().not_null())
                    .col(ColumnDef::new(Charge::ExpenseReportId).uuid())
                    .col(ColumnDef::new(Charge::ExpenseDate).date().not_null())
                    .col(ColumnDef::new(Charge::Merchant).string_len(50).not_null())
                    .col(ColumnDef::new(Charge::Location).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Charge::BilledAmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Charge::TransactionAmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Charge::Description).string_len(250).not_null())
                    .col(ColumnDef::new(Charge::Notes).string_len(250))
                    .col(
                        ColumnDef::new(Charge::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .col(
                        ColumnDef::new(Charge::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("now()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_charge_employee")
                            .from(Charge::Table, Charge::EmployeeId)
                            .to(Employee::Table, Employee::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_charge_expense_report")
                            .from(Charge::Table, Charge::ExpenseReportId)
                            .to(ExpenseReport::Table, ExpenseReport::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_charge_employee")
                    .table(Charge::Table)
                    .col(Charge::EmployeeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_charge_expense_report")
                    .table(Charge::Table)
                    .col(Charge::ExpenseReportId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Charge::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExpenseReport::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employee::Table).to_owned())
            .await?;
        Ok(())
    }
}
