use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "employee")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Unique lookup key used to resolve the current user.
    #[sea_orm(unique, indexed)]
    pub alias: String,
    /// Manager name, used as the default approver on new reports.
    pub manager: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Charge,
    ExpenseReport,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Charge => Entity::has_many(super::charge::Entity).into(),
            Self::ExpenseReport => Entity::has_many(super::expense_report::Entity).into(),
        }
    }
}

impl Related<super::charge::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Charge.def()
    }
}

impl Related<super::expense_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseReport.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
