use sea_orm::entity::prelude::*;

/// A single recorded expense transaction. A null `expense_report_id` means
/// the charge is outstanding; reassigning it is the only way a charge moves
/// between the outstanding and associated sets.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "charge")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    #[sea_orm(indexed)]
    pub expense_report_id: Option<Uuid>,
    pub expense_date: Date,
    pub merchant: String,
    pub location: String,
    pub billed_amount_cents: i64,
    pub transaction_amount_cents: i64,
    pub description: String,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id",
        on_delete = "Cascade"
    )]
    Employee,
    #[sea_orm(
        belongs_to = "super::expense_report::Entity",
        from = "Column::ExpenseReportId",
        to = "super::expense_report::Column::Id",
        on_delete = "SetNull"
    )]
    ExpenseReport,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::expense_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseReport.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
