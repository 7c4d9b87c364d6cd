use sea_orm::entity::prelude::*;

/// A bundle of charges submitted together for reimbursement approval.
/// `amount_cents` is derived from the associated charges' billed amounts and
/// is recomputed by the workflow at every persistence.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "expense_report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub employee_id: Uuid,
    pub status: Status,
    pub amount_cents: i64,
    pub cost_center: i32,
    pub notes: String,
    pub approver: String,
    pub date_submitted: Option<Date>,
    pub date_resolved: Option<Date>,
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
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::charge::Entity> for Entity {
    fn to() -> RelationDef {
        super::charge::Relation::ExpenseReport.def().rev()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum Status {
    #[sea_orm(string_value = "SAVED")]
    Saved,
    #[sea_orm(string_value = "SUBMITTED")]
    Submitted,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
}

impl ActiveModelBehavior for ActiveModel {}
