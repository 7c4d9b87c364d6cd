use std::sync::Arc;

use async_graphql::{
    Context, EmptySubscription, Enum, Error, ErrorExtensions, InputObject, Object, Schema,
    SimpleObject, ID,
};
use chrono::{Duration, NaiveDate, Utc};
use entity::{charge, employee, expense_report};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::info_span;
use uuid::Uuid;

use crate::identity::{CurrentEmployee, MutationToken, DEMO_EMPLOYEE_ALIAS};

pub struct AppSchema(pub Schema<QueryRoot, MutationRoot, EmptySubscription>);

pub fn build_schema(db: Arc<DatabaseConnection>) -> AppSchema {
    let schema = Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(db)
        .finish();
    AppSchema(schema)
}

pub struct QueryRoot;
pub struct MutationRoot;

const DEFAULT_COST_CENTER: i32 = 1055;
const RECENT_APPROVAL_WINDOW_DAYS: i64 = 90;
const MAX_AMOUNT_CENTS: i64 = 100_000_000;

#[Object]
impl QueryRoot {
    async fn expenses(&self) -> ExpensesQuery {
        ExpensesQuery
    }
}

#[Object]
impl MutationRoot {
    async fn expenses(&self) -> ExpensesMutation {
        ExpensesMutation
    }
}

#[derive(Default)]
pub struct ExpensesQuery;

#[derive(Default)]
pub struct ExpensesMutation;

#[Object]
impl ExpensesQuery {
    async fn me(&self, ctx: &Context<'_>) -> async_graphql::Result<EmployeeNode> {
        let current = require_employee(ctx)?;
        let db = database(ctx)?;
        let record = employee::Entity::find_by_id(current.employee_id)
            .one(db.as_ref())
            .await
            .map_err(db_error)?
            .ok_or_else(|| error_with_code("NOT_FOUND", "Employee not found"))?;
        Ok(record.into())
    }

    async fn dashboard(&self, ctx: &Context<'_>) -> async_graphql::Result<DashboardView> {
        let current = require_employee(ctx)?;
        let db = database(ctx)?;
        let span = info_span!("expenses.dashboard");
        let _guard = span.enter();

        let outstanding = load_outstanding_charges(db.as_ref(), current.employee_id).await?;
        let in_progress =
            load_reports_by_status(db.as_ref(), current.employee_id, expense_report::Status::Saved)
                .await?;
        let pending = load_reports_by_status(
            db.as_ref(),
            current.employee_id,
            expense_report::Status::Submitted,
        )
        .await?;
        let recently_approved =
            load_recently_approved_reports(db.as_ref(), current.employee_id).await?;

        Ok(DashboardView {
            user_name: current.display_name.clone(),
            outstanding_charges: outstanding.into_iter().map(ChargeNode::from).collect(),
            reports_in_progress: in_progress.into_iter().map(ReportNode::from).collect(),
            reports_pending_approval: pending.into_iter().map(ReportNode::from).collect(),
            recently_approved_reports: recently_approved
                .into_iter()
                .map(ReportNode::from)
                .collect(),
        })
    }

    /// The current employee's outstanding charges.
    async fn charges(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<ChargeNode>> {
        let current = require_employee(ctx)?;
        let db = database(ctx)?;
        let rows = load_outstanding_charges(db.as_ref(), current.employee_id).await?;
        Ok(rows.into_iter().map(ChargeNode::from).collect())
    }

    async fn charge(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<ChargeNode> {
        let current = require_employee(ctx)?;
        let db = database(ctx)?;
        let charge_id = parse_uuid(&id)?;
        let record = load_owned_charge(db.as_ref(), current.employee_id, charge_id).await?;
        Ok(record.into())
    }

    async fn reports(&self, ctx: &Context<'_>) -> async_graphql::Result<ReportsView> {
        let current = require_employee(ctx)?;
        let db = database(ctx)?;
        let span = info_span!("expenses.reports.list");
        let _guard = span.enter();

        let saved =
            load_reports_by_status(db.as_ref(), current.employee_id, expense_report::Status::Saved)
                .await?;
        let submitted = load_reports_by_status(
            db.as_ref(),
            current.employee_id,
            expense_report::Status::Submitted,
        )
        .await?;
        let recently_approved =
            load_recently_approved_reports(db.as_ref(), current.employee_id).await?;

        Ok(ReportsView {
            saved_reports: saved.into_iter().map(ReportNode::from).collect(),
            submitted_reports: submitted.into_iter().map(ReportNode::from).collect(),
            recently_approved_reports: recently_approved
                .into_iter()
                .map(ReportNode::from)
                .collect(),
        })
    }

    async fn report(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<ReportDetail> {
        let current = require_employee(ctx)?;
        let db = database(ctx)?;
        let report_id = parse_uuid(&id)?;
        let report = load_owned_report(db.as_ref(), current.employee_id, report_id).await?;
        let associated =
            load_associated_charges(db.as_ref(), current.employee_id, report_id).await?;
        let outstanding = load_outstanding_charges(db.as_ref(), current.employee_id).await?;
        Ok(ReportDetail {
            report: report.into(),
            associated_charges: associated.into_iter().map(ChargeNode::from).collect(),
            outstanding_charges: outstanding.into_iter().map(ChargeNode::from).collect(),
            has_unsaved_changes: false,
        })
    }

    /// Rehydrates a pending report edit from explicit id sets, applies at
    /// most one add/remove move, and recomputes the total. Read-only: the
    /// result is persisted only through createReport/saveReport.
    #[allow(clippy::too_many_arguments)]
    #[graphql(name = "reportEditor")]
    async fn report_editor(
        &self,
        ctx: &Context<'_>,
        id: Option<ID>,
        #[graphql(name = "associatedChargeIds")] associated_charge_ids: Option<Vec<ID>>,
        #[graphql(name = "outstandingChargeIds")] outstanding_charge_ids: Option<Vec<ID>>,
        #[graphql(name = "addChargeId")] add_charge_id: Option<ID>,
        #[graphql(name = "removeChargeId")] remove_charge_id: Option<ID>,
    ) -> async_graphql::Result<ReportEditorView> {
        let current = require_employee(ctx)?;
        let db = database(ctx)?;
        let span = info_span!(
            "expenses.report.editor",
            has_add = add_charge_id.is_some(),
            has_remove = remove_charge_id.is_some()
        );
        let _guard = span.enter();

        let report = match &id {
            Some(report_id) => Some(
                load_owned_report(db.as_ref(), current.employee_id, parse_uuid(report_id)?).await?,
            ),
            None => None,
        };

        let mut associated = match &associated_charge_ids {
            Some(ids) => {
                let ids = parse_charge_ids(ids);
                load_owned_charges(db.as_ref(), current.employee_id, &ids).await?
            }
            None => match &report {
                Some(report) => {
                    load_associated_charges(db.as_ref(), current.employee_id, report.id).await?
                }
                None => Vec::new(),
            },
        };
        let mut outstanding = match &outstanding_charge_ids {
            Some(ids) => {
                let ids = parse_charge_ids(ids);
                load_owned_charges(db.as_ref(), current.employee_id, &ids).await?
            }
            None => load_outstanding_charges(db.as_ref(), current.employee_id).await?,
        };

        // Add takes precedence when both are supplied, matching the form's
        // one-button-per-request behavior. Stale ids are a silent no-op.
        let mut moved = false;
        if let Some(add_id) = &add_charge_id {
            moved = move_charge(parse_uuid(add_id)?, &mut outstanding, &mut associated);
        } else if let Some(remove_id) = &remove_charge_id {
            moved = move_charge(parse_uuid(remove_id)?, &mut associated, &mut outstanding);
        }

        let amount_cents = sum_billed(&associated);
        let (status, notes, approver, cost_center) = match &report {
            Some(report) => (
                ReportStatus::from(report.status),
                report.notes.clone(),
                report.approver.clone(),
                report.cost_center,
            ),
            None => (
                ReportStatus::Saved,
                String::new(),
                current.manager.clone(),
                DEFAULT_COST_CENTER,
            ),
        };

        Ok(ReportEditorView {
            id,
            status,
            notes,
            approver,
            cost_center,
            amount_cents,
            associated_charges: associated.into_iter().map(ChargeNode::from).collect(),
            outstanding_charges: outstanding.into_iter().map(ChargeNode::from).collect(),
            has_unsaved_changes: moved,
        })
    }
}

#[Object]
impl ExpensesMutation {
    #[graphql(name = "createCharge")]
    async fn create_charge(
        &self,
        ctx: &Context<'_>,
        input: NewChargeInput,
    ) -> async_graphql::Result<ChargeNode> {
        let current = require_employee(ctx)?;
        require_mutation_token(ctx)?;
        let db = database(ctx)?;
        let span = info_span!("expenses.charge.create");
        let _guard = span.enter();

        let merchant = validate_required("merchant", &input.merchant, 50)?;
        let location = validate_required("location", &input.location, 50)?;
        let description = validate_required("description", &input.description, 250)?;
        let notes = validate_optional("notes", input.notes, 250)?;
        validate_amount_cents("billedAmountCents", input.billed_amount_cents)?;
        validate_amount_cents("transactionAmountCents", input.transaction_amount_cents)?;

        let charge_id = Uuid::new_v4();
        let now: DateTimeWithTimeZone = Utc::now().into();
        let active = charge::ActiveModel {
            id: Set(charge_id),
            employee_id: Set(current.employee_id),
            expense_report_id: Set(None),
            expense_date: Set(input.expense_date),
            merchant: Set(merchant),
            location: Set(location),
            billed_amount_cents: Set(input.billed_amount_cents),
            transaction_amount_cents: Set(input.transaction_amount_cents),
            description: Set(description),
            notes: Set(notes),
            created_at: Set(now),
            updated_at: Set(now),
        };
        charge::Entity::insert(active)
            .exec_without_returning(db.as_ref())
            .await
            .map_err(db_error)?;
        let record = charge::Entity::find_by_id(charge_id)
            .one(db.as_ref())
            .await
            .map_err(db_error)?
            .ok_or_else(|| error_with_code("INTERNAL", "Failed to load inserted charge"))?;
        Ok(record.into())
    }

    #[graphql(name = "updateCharge")]
    async fn update_charge(
        &self,
        ctx: &Context<'_>,
        input: UpdateChargeInput,
    ) -> async_graphql::Result<ChargeNode> {
        let current = require_employee(ctx)?;
        require_mutation_token(ctx)?;
        let db = database(ctx)?;
        let charge_id = parse_uuid(&input.id)?;
        let existing = load_owned_charge(db.as_ref(), current.employee_id, charge_id).await?;
        let mut active: charge::ActiveModel = existing.into();
        if let Some(expense_date) = input.expense_date {
            active.expense_date = Set(expense_date);
        }
        if let Some(merchant) = &input.merchant {
            active.merchant = Set(validate_required("merchant", merchant, 50)?);
        }
        if let Some(location) = &input.location {
            active.location = Set(validate_required("location", location, 50)?);
        }
        if let Some(billed) = input.billed_amount_cents {
            validate_amount_cents("billedAmountCents", billed)?;
            active.billed_amount_cents = Set(billed);
        }
        if let Some(transaction) = input.transaction_amount_cents {
            validate_amount_cents("transactionAmountCents", transaction)?;
            active.transaction_amount_cents = Set(transaction);
        }
        if let Some(description) = &input.description {
            active.description = Set(validate_required("description", description, 250)?);
        }
        if input.notes.is_some() {
            active.notes = Set(validate_optional("notes", input.notes.clone(), 250)?);
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db.as_ref()).await.map_err(db_error)?;
        Ok(updated.into())
    }

    #[graphql(name = "deleteCharge")]
    async fn delete_charge(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let current = require_employee(ctx)?;
        require_mutation_token(ctx)?;
        let db = database(ctx)?;
        let charge_id = parse_uuid(&id)?;
        load_owned_charge(db.as_ref(), current.employee_id, charge_id).await?;
        let res = charge::Entity::delete_by_id(charge_id)
            .exec(db.as_ref())
            .await
            .map_err(db_error)?;
        Ok(res.rows_affected > 0)
    }

    /// Creates a report in Saved status from a set of outstanding charges.
    /// The total is recomputed from the associated charges' billed amounts;
    /// any client-sent total is display-only and ignored.
    #[graphql(name = "createReport")]
    async fn create_report(
        &self,
        ctx: &Context<'_>,
        input: NewReportInput,
    ) -> async_graphql::Result<ReportNode> {
        let current = require_employee(ctx)?;
        require_mutation_token(ctx)?;
        let db = database(ctx)?;
        let span = info_span!("expenses.report.create");
        let _guard = span.enter();

        let notes = validate_required("notes", &input.notes, 250)?;
        let approver = match &input.approver {
            Some(approver) => validate_required("approver", approver, 25)?,
            None => current.manager.clone(),
        };
        let cost_center = input.cost_center.unwrap_or(DEFAULT_COST_CENTER);
        let ids = parse_charge_ids(&input.associated_charge_ids);

        let txn = db.begin().await.map_err(db_error)?;
        let associated = load_owned_charges(&txn, current.employee_id, &ids).await?;
        let amount_cents = sum_billed(&associated);

        let report_id = Uuid::new_v4();
        let now: DateTimeWithTimeZone = Utc::now().into();
        let report = expense_report::ActiveModel {
            id: Set(report_id),
            employee_id: Set(current.employee_id),
            status: Set(expense_report::Status::Saved),
            amount_cents: Set(amount_cents),
            cost_center: Set(cost_center),
            notes: Set(notes),
            approver: Set(approver),
            date_submitted: Set(None),
            date_resolved: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        expense_report::Entity::insert(report)
            .exec_without_returning(&txn)
            .await
            .map_err(db_error)?;
        attach_charges(&txn, associated, Some(report_id), now).await?;
        txn.commit().await.map_err(db_error)?;

        let record = expense_report::Entity::find_by_id(report_id)
            .one(db.as_ref())
            .await
            .map_err(db_error)?
            .ok_or_else(|| error_with_code("INTERNAL", "Failed to load inserted report"))?;
        Ok(record.into())
    }

    /// Persists a pending edit: associates every charge in the associated
    /// set, disassociates every charge in the outstanding set, updates the
    /// notes, and recomputes the total. One transaction.
    #[graphql(name = "saveReport")]
    async fn save_report(
        &self,
        ctx: &Context<'_>,
        input: SaveReportInput,
    ) -> async_graphql::Result<ReportDetail> {
        let current = require_employee(ctx)?;
        require_mutation_token(ctx)?;
        let db = database(ctx)?;
        let report_id = parse_uuid(&input.id)?;
        let span = info_span!("expenses.report.save");
        let _guard = span.enter();

        let report = load_owned_report(db.as_ref(), current.employee_id, report_id).await?;
        let notes = validate_required("notes", &input.notes, 250)?;
        let associated_ids = parse_charge_ids(&input.associated_charge_ids);
        let outstanding_ids = parse_charge_ids(&input.outstanding_charge_ids);

        let txn = db.begin().await.map_err(db_error)?;
        let associated = load_owned_charges(&txn, current.employee_id, &associated_ids).await?;
        let outstanding = load_owned_charges(&txn, current.employee_id, &outstanding_ids).await?;
        let amount_cents = sum_billed(&associated);
        let now: DateTimeWithTimeZone = Utc::now().into();

        attach_charges(&txn, associated, Some(report_id), now).await?;
        attach_charges(&txn, outstanding, None, now).await?;

        let mut active: expense_report::ActiveModel = report.into();
        active.notes = Set(notes);
        active.amount_cents = Set(amount_cents);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await.map_err(db_error)?;
        txn.commit().await.map_err(db_error)?;

        let associated =
            load_associated_charges(db.as_ref(), current.employee_id, report_id).await?;
        let outstanding = load_outstanding_charges(db.as_ref(), current.employee_id).await?;
        Ok(ReportDetail {
            report: updated.into(),
            associated_charges: associated.into_iter().map(ChargeNode::from).collect(),
            outstanding_charges: outstanding.into_iter().map(ChargeNode::from).collect(),
            has_unsaved_changes: false,
        })
    }

    /// Saved -> Submitted. Any other starting status is a bad request and
    /// leaves the report untouched.
    #[graphql(name = "submitReport")]
    async fn submit_report(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<ReportNode> {
        let current = require_employee(ctx)?;
        require_mutation_token(ctx)?;
        let db = database(ctx)?;
        let report_id = parse_uuid(&id)?;
        let report = load_owned_report(db.as_ref(), current.employee_id, report_id).await?;
        if report.status != expense_report::Status::Saved {
            return Err(error_with_code(
                "BAD_REQUEST",
                "Only a saved report can be submitted for approval",
            ));
        }
        let span = info_span!("expenses.report.submit");
        let _guard = span.enter();

        let txn = db.begin().await.map_err(db_error)?;
        let associated = load_associated_charges(&txn, current.employee_id, report_id).await?;
        let mut active: expense_report::ActiveModel = report.into();
        active.status = Set(expense_report::Status::Submitted);
        active.date_submitted = Set(Some(today()));
        active.amount_cents = Set(sum_billed(&associated));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(db_error)?;
        txn.commit().await.map_err(db_error)?;
        Ok(updated.into())
    }

    /// Submitted -> Approved; stamps the resolution date.
    #[graphql(name = "approveReport")]
    async fn approve_report(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<ReportNode> {
        let current = require_employee(ctx)?;
        require_mutation_token(ctx)?;
        let db = database(ctx)?;
        let report_id = parse_uuid(&id)?;
        let report = load_owned_report(db.as_ref(), current.employee_id, report_id).await?;
        if report.status != expense_report::Status::Submitted {
            return Err(error_with_code(
                "BAD_REQUEST",
                "Only a submitted report can be approved",
            ));
        }
        let span = info_span!("expenses.report.approve");
        let _guard = span.enter();

        let mut active: expense_report::ActiveModel = report.into();
        active.status = Set(expense_report::Status::Approved);
        active.date_resolved = Set(Some(today()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db.as_ref()).await.map_err(db_error)?;
        Ok(updated.into())
    }

    /// Submitted -> Saved; the resolution date is left untouched.
    #[graphql(name = "rejectReport")]
    async fn reject_report(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<ReportNode> {
        let current = require_employee(ctx)?;
        require_mutation_token(ctx)?;
        let db = database(ctx)?;
        let report_id = parse_uuid(&id)?;
        let report = load_owned_report(db.as_ref(), current.employee_id, report_id).await?;
        if report.status != expense_report::Status::Submitted {
            return Err(error_with_code(
                "BAD_REQUEST",
                "Only a submitted report can be rejected",
            ));
        }
        let span = info_span!("expenses.report.reject");
        let _guard = span.enter();

        let mut active: expense_report::ActiveModel = report.into();
        active.status = Set(expense_report::Status::Saved);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db.as_ref()).await.map_err(db_error)?;
        Ok(updated.into())
    }

    /// Disassociates every charge on the report, then deletes the report.
    /// The charges survive as outstanding.
    #[graphql(name = "deleteReport")]
    async fn delete_report(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let current = require_employee(ctx)?;
        require_mutation_token(ctx)?;
        let db = database(ctx)?;
        let report_id = parse_uuid(&id)?;
        load_owned_report(db.as_ref(), current.employee_id, report_id).await?;
        let span = info_span!("expenses.report.delete");
        let _guard = span.enter();

        let txn = db.begin().await.map_err(db_error)?;
        let associated = load_associated_charges(&txn, current.employee_id, report_id).await?;
        let now: DateTimeWithTimeZone = Utc::now().into();
        attach_charges(&txn, associated, None, now).await?;
        let res = expense_report::Entity::delete_by_id(report_id)
            .exec(&txn)
            .await
            .map_err(db_error)?;
        txn.commit().await.map_err(db_error)?;
        Ok(res.rows_affected > 0)
    }

    /// Wipes all expense data and recreates the demo employee with sample
    /// charges and reports.
    #[graphql(name = "resetDemoData")]
    async fn reset_demo_data(&self, ctx: &Context<'_>) -> async_graphql::Result<bool> {
        require_employee(ctx)?;
        require_mutation_token(ctx)?;
        let db = database(ctx)?;
        reset_demo_data(db.as_ref()).await.map_err(db_error)?;
        Ok(true)
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum ReportStatus {
    Saved,
    Submitted,
    Approved,
}

impl From<expense_report::Status> for ReportStatus {
    fn from(value: expense_report::Status) -> Self {
        match value {
            expense_report::Status::Saved => ReportStatus::Saved,
            expense_report::Status::Submitted => ReportStatus::Submitted,
            expense_report::Status::Approved => ReportStatus::Approved,
        }
    }
}

impl From<ReportStatus> for expense_report::Status {
    fn from(value: ReportStatus) -> Self {
        match value {
            ReportStatus::Saved => expense_report::Status::Saved,
            ReportStatus::Submitted => expense_report::Status::Submitted,
            ReportStatus::Approved => expense_report::Status::Approved,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Employee")]
pub struct EmployeeNode {
    pub id: ID,
    pub name: String,
    pub alias: String,
    pub manager: String,
}

impl From<employee::Model> for EmployeeNode {
    fn from(model: employee::Model) -> Self {
        Self {
            id: ID::from(model.id.to_string()),
            name: model.name,
            alias: model.alias,
            manager: model.manager,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Charge")]
pub struct ChargeNode {
    pub id: ID,
    #[graphql(name = "employeeId")]
    pub employee_id: ID,
    #[graphql(name = "expenseReportId")]
    pub expense_report_id: Option<ID>,
    #[graphql(name = "expenseDate")]
    pub expense_date: NaiveDate,
    pub merchant: String,
    pub location: String,
    #[graphql(name = "billedAmountCents")]
    pub billed_amount_cents: i64,
    #[graphql(name = "transactionAmountCents")]
    pub transaction_amount_cents: i64,
    pub description: String,
    pub notes: Option<String>,
}

impl From<charge::Model> for ChargeNode {
    fn from(model: charge::Model) -> Self {
        Self {
            id: ID::from(model.id.to_string()),
            employee_id: ID::from(model.employee_id.to_string()),
            expense_report_id: model.expense_report_id.map(|id| ID::from(id.to_string())),
            expense_date: model.expense_date,
            merchant: model.merchant,
            location: model.location,
            billed_amount_cents: model.billed_amount_cents,
            transaction_amount_cents: model.transaction_amount_cents,
            description: model.description,
            notes: model.notes,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "ExpenseReport")]
pub struct ReportNode {
    pub id: ID,
    #[graphql(name = "employeeId")]
    pub employee_id: ID,
    pub status: ReportStatus,
    #[graphql(name = "amountCents")]
    pub amount_cents: i64,
    #[graphql(name = "costCenter")]
    pub cost_center: i32,
    pub notes: String,
    pub approver: String,
    #[graphql(name = "dateSubmitted")]
    pub date_submitted: Option<NaiveDate>,
    #[graphql(name = "dateResolved")]
    pub date_resolved: Option<NaiveDate>,
}

impl From<expense_report::Model> for ReportNode {
    fn from(model: expense_report::Model) -> Self {
        Self {
            id: ID::from(model.id.to_string()),
            employee_id: ID::from(model.employee_id.to_string()),
            status: model.status.into(),
            amount_cents: model.amount_cents,
            cost_center: model.cost_center,
            notes: model.notes,
            approver: model.approver,
            date_submitted: model.date_submitted,
            date_resolved: model.date_resolved,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct DashboardView {
    #[graphql(name = "userName")]
    pub user_name: String,
    #[graphql(name = "outstandingCharges")]
    pub outstanding_charges: Vec<ChargeNode>,
    #[graphql(name = "reportsInProgress")]
    pub reports_in_progress: Vec<ReportNode>,
    #[graphql(name = "reportsPendingApproval")]
    pub reports_pending_approval: Vec<ReportNode>,
    #[graphql(name = "recentlyApprovedReports")]
    pub recently_approved_reports: Vec<ReportNode>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct ReportsView {
    #[graphql(name = "savedReports")]
    pub saved_reports: Vec<ReportNode>,
    #[graphql(name = "submittedReports")]
    pub submitted_reports: Vec<ReportNode>,
    #[graphql(name = "recentlyApprovedReports")]
    pub recently_approved_reports: Vec<ReportNode>,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct ReportDetail {
    pub report: ReportNode,
    #[graphql(name = "associatedCharges")]
    pub associated_charges: Vec<ChargeNode>,
    #[graphql(name = "outstandingCharges")]
    pub outstanding_charges: Vec<ChargeNode>,
    #[graphql(name = "hasUnsavedChanges")]
    pub has_unsaved_changes: bool,
}

#[derive(Clone, Debug, SimpleObject)]
pub struct ReportEditorView {
    pub id: Option<ID>,
    pub status: ReportStatus,
    pub notes: String,
    pub approver: String,
    #[graphql(name = "costCenter")]
    pub cost_center: i32,
    #[graphql(name = "amountCents")]
    pub amount_cents: i64,
    #[graphql(name = "associatedCharges")]
    pub associated_charges: Vec<ChargeNode>,
    #[graphql(name = "outstandingCharges")]
    pub outstanding_charges: Vec<ChargeNode>,
    #[graphql(name = "hasUnsavedChanges")]
    pub has_unsaved_changes: bool,
}

#[derive(Clone, Debug, InputObject)]
pub struct NewChargeInput {
    #[graphql(name = "expenseDate")]
    pub expense_date: NaiveDate,
    pub merchant: String,
    pub location: String,
    #[graphql(name = "billedAmountCents")]
    pub billed_amount_cents: i64,
    #[graphql(name = "transactionAmountCents")]
    pub transaction_amount_cents: i64,
    pub description: String,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, InputObject)]
pub struct UpdateChargeInput {
    pub id: ID,
    #[graphql(name = "expenseDate")]
    pub expense_date: Option<NaiveDate>,
    pub merchant: Option<String>,
    pub location: Option<String>,
    #[graphql(name = "billedAmountCents")]
    pub billed_amount_cents: Option<i64>,
    #[graphql(name = "transactionAmountCents")]
    pub transaction_amount_cents: Option<i64>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, InputObject)]
pub struct NewReportInput {
    pub notes: String,
    pub approver: Option<String>,
    #[graphql(name = "costCenter")]
    pub cost_center: Option<i32>,
    #[graphql(name = "associatedChargeIds")]
    pub associated_charge_ids: Vec<ID>,
}

#[derive(Clone, Debug, InputObject)]
pub struct SaveReportInput {
    pub id: ID,
    pub notes: String,
    #[graphql(name = "associatedChargeIds")]
    pub associated_charge_ids: Vec<ID>,
    #[graphql(name = "outstandingChargeIds")]
    pub outstanding_charge_ids: Vec<ID>,
}

/// Moves the first charge with the given id from one list to the other,
/// appending at the destination's end. Returns false (no-op) when the id is
/// not present; stale ids from a pending edit are tolerated silently.
fn move_charge(id: Uuid, from: &mut Vec<charge::Model>, to: &mut Vec<charge::Model>) -> bool {
    let Some(index) = from.iter().position(|c| c.id == id) else {
        return false;
    };
    let moved = from.remove(index);
    to.push(moved);
    true
}

fn sum_billed(charges: &[charge::Model]) -> i64 {
    charges.iter().map(|c| c.billed_amount_cents).sum()
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Entries that are not well-formed ids are dropped, mirroring the silent
/// handling of list entries that resolve to nothing.
fn parse_charge_ids(ids: &[ID]) -> Vec<Uuid> {
    ids.iter()
        .filter_map(|id| Uuid::parse_str(id.as_str()).ok())
        .collect()
}

async fn attach_charges<C: ConnectionTrait>(
    db: &C,
    charges: Vec<charge::Model>,
    report_id: Option<Uuid>,
    now: DateTimeWithTimeZone,
) -> async_graphql::Result<()> {
    for record in charges {
        let mut active: charge::ActiveModel = record.into();
        active.expense_report_id = Set(report_id);
        active.updated_at = Set(now);
        active.update(db).await.map_err(db_error)?;
    }
    Ok(())
}

/// Loads the subset of `ids` that are charges owned by the employee, sorted
/// ascending by id. Unknown and foreign ids are silently dropped; the
/// ownership filter lives in the lookup, not in the id encoding.
async fn load_owned_charges<C: ConnectionTrait>(
    db: &C,
    employee_id: Uuid,
    ids: &[Uuid],
) -> async_graphql::Result<Vec<charge::Model>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    charge::Entity::find()
        .filter(charge::Column::Id.is_in(ids.iter().copied()))
        .filter(charge::Column::EmployeeId.eq(employee_id))
        .order_by_asc(charge::Column::Id)
        .all(db)
        .await
        .map_err(db_error)
}

async fn load_owned_charge<C: ConnectionTrait>(
    db: &C,
    employee_id: Uuid,
    id: Uuid,
) -> async_graphql::Result<charge::Model> {
    charge::Entity::find_by_id(id)
        .filter(charge::Column::EmployeeId.eq(employee_id))
        .one(db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error_with_code("NOT_FOUND", "Charge not found"))
}

async fn load_owned_report<C: ConnectionTrait>(
    db: &C,
    employee_id: Uuid,
    id: Uuid,
) -> async_graphql::Result<expense_report::Model> {
    expense_report::Entity::find_by_id(id)
        .filter(expense_report::Column::EmployeeId.eq(employee_id))
        .one(db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error_with_code("NOT_FOUND", "Expense report not found"))
}

async fn load_outstanding_charges<C: ConnectionTrait>(
    db: &C,
    employee_id: Uuid,
) -> async_graphql::Result<Vec<charge::Model>> {
    charge::Entity::find()
        .filter(charge::Column::EmployeeId.eq(employee_id))
        .filter(charge::Column::ExpenseReportId.is_null())
        .order_by_asc(charge::Column::Id)
        .all(db)
        .await
        .map_err(db_error)
}

async fn load_associated_charges<C: ConnectionTrait>(
    db: &C,
    employee_id: Uuid,
    report_id: Uuid,
) -> async_graphql::Result<Vec<charge::Model>> {
    charge::Entity::find()
        .filter(charge::Column::EmployeeId.eq(employee_id))
        .filter(charge::Column::ExpenseReportId.eq(report_id))
        .order_by_asc(charge::Column::Id)
        .all(db)
        .await
        .map_err(db_error)
}

async fn load_reports_by_status<C: ConnectionTrait>(
    db: &C,
    employee_id: Uuid,
    status: expense_report::Status,
) -> async_graphql::Result<Vec<expense_report::Model>> {
    expense_report::Entity::find()
        .filter(expense_report::Column::EmployeeId.eq(employee_id))
        .filter(expense_report::Column::Status.eq(status))
        .order_by_desc(expense_report::Column::UpdatedAt)
        .all(db)
        .await
        .map_err(db_error)
}

/// Approved reports resolved within the last 90 days, boundary inclusive.
async fn load_recently_approved_reports<C: ConnectionTrait>(
    db: &C,
    employee_id: Uuid,
) -> async_graphql::Result<Vec<expense_report::Model>> {
    let cutoff = today() - Duration::days(RECENT_APPROVAL_WINDOW_DAYS);
    expense_report::Entity::find()
        .filter(expense_report::Column::EmployeeId.eq(employee_id))
        .filter(expense_report::Column::Status.eq(expense_report::Status::Approved))
        .filter(expense_report::Column::DateResolved.gte(cutoff))
        .order_by_desc(expense_report::Column::UpdatedAt)
        .all(db)
        .await
        .map_err(db_error)
}

fn database(ctx: &Context<'_>) -> async_graphql::Result<Arc<DatabaseConnection>> {
    ctx.data::<Arc<DatabaseConnection>>()
        .cloned()
        .map_err(|_| error_with_code("INTERNAL", "Missing database connection"))
}

fn require_employee(ctx: &Context<'_>) -> async_graphql::Result<CurrentEmployee> {
    ctx.data::<CurrentEmployee>()
        .cloned()
        .map_err(|_| error_with_code("UNAUTHENTICATED", "Unknown employee"))
}

fn require_mutation_token(ctx: &Context<'_>) -> async_graphql::Result<()> {
    ctx.data::<MutationToken>()
        .map(|_| ())
        .map_err(|_| error_with_code("FORBIDDEN", "Missing or invalid anti-forgery token"))
}

fn parse_uuid(id: &ID) -> async_graphql::Result<Uuid> {
    Uuid::parse_str(id.as_str()).map_err(|_| error_with_code("BAD_REQUEST", "Invalid ID"))
}

fn db_error(err: DbErr) -> Error {
    error_with_code("INTERNAL", format!("Database error: {}", err))
}

fn error_with_code(code: &'static str, message: impl Into<String>) -> Error {
    Error::new(message).extend_with(|_, e| e.set("code", code))
}

fn validation_error(message: impl Into<String>) -> Error {
    error_with_code("VALIDATION", message)
}

fn validate_required(field: &str, value: &str, max: usize) -> async_graphql::Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(validation_error(format!("{} is required", field)));
    }
    validate_length(field, trimmed, max)?;
    Ok(trimmed.to_string())
}

fn validate_optional(
    field: &str,
    value: Option<String>,
    max: usize,
) -> async_graphql::Result<Option<String>> {
    if let Some(ref text) = value {
        validate_length(field, text, max)?;
    }
    Ok(value)
}

fn validate_length(field: &str, value: &str, max: usize) -> async_graphql::Result<()> {
    if value.chars().count() > max {
        return Err(validation_error(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

fn validate_amount_cents(field: &str, value: i64) -> async_graphql::Result<()> {
    if !(0..=MAX_AMOUNT_CENTS).contains(&value) {
        return Err(validation_error(format!(
            "{} must be between 0 and {}",
            field, MAX_AMOUNT_CENTS
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SeededExpenseRecords {
    pub employee: employee::Model,
    pub charges: Vec<charge::Model>,
    pub reports: Vec<expense_report::Model>,
}

impl SeededExpenseRecords {
    pub fn report_with_status(
        &self,
        status: expense_report::Status,
    ) -> Option<&expense_report::Model> {
        self.reports.iter().find(|r| r.status == status)
    }

    pub fn outstanding_charges(&self) -> Vec<&charge::Model> {
        self.charges
            .iter()
            .filter(|c| c.expense_report_id.is_none())
            .collect()
    }
}

pub async fn seed_expenses_demo(db: &DatabaseConnection) -> Result<SeededExpenseRecords, DbErr> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let today = Utc::now().date_naive();

    let demo_employee = employee::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("John Doe".into()),
        alias: Set(DEMO_EMPLOYEE_ALIAS.into()),
        manager: Set("Ellen Adams".into()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    insert_seed_charge(
        db,
        demo_employee.id,
        None,
        today - Duration::days(2),
        "Contoso Diner",
        "Redmond, WA",
        2_350,
        2_350,
        "Team lunch with partner engineers",
    )
    .await?;
    insert_seed_charge(
        db,
        demo_employee.id,
        None,
        today - Duration::days(4),
        "City Cab Co.",
        "Seattle, WA",
        4_200,
        4_200,
        "Taxi from airport to customer site",
    )
    .await?;
    insert_seed_charge(
        db,
        demo_employee.id,
        None,
        today - Duration::days(6),
        "Office Depot",
        "Bellevue, WA",
        1_825,
        1_825,
        "Whiteboard markers and notepads",
    )
    .await?;

    let saved_hotel = insert_seed_charge(
        db,
        demo_employee.id,
        None,
        today - Duration::days(12),
        "Grand Hotel",
        "Chicago, IL",
        38_900,
        38_900,
        "Two nights, customer workshop",
    )
    .await?;
    let saved_flight = insert_seed_charge(
        db,
        demo_employee.id,
        None,
        today - Duration::days(13),
        "Blue Yonder Airlines",
        "Chicago, IL",
        41_750,
        41_750,
        "Round trip to customer workshop",
    )
    .await?;
    let saved_report = insert_seed_report(
        db,
        demo_employee.id,
        expense_report::Status::Saved,
        &[&saved_hotel, &saved_flight],
        "Customer workshop travel",
        &demo_employee.manager,
        None,
        None,
    )
    .await?;

    let submitted_dinner = insert_seed_charge(
        db,
        demo_employee.id,
        None,
        today - Duration::days(20),
        "Fourth Coffee",
        "Portland, OR",
        6_475,
        6_475,
        "Dinner during conference",
    )
    .await?;
    let submitted_report = insert_seed_report(
        db,
        demo_employee.id,
        expense_report::Status::Submitted,
        &[&submitted_dinner],
        "Conference meals",
        &demo_employee.manager,
        Some(today - Duration::days(18)),
        None,
    )
    .await?;

    let approved_train = insert_seed_charge(
        db,
        demo_employee.id,
        None,
        today - Duration::days(40),
        "Northwind Rail",
        "Vancouver, BC",
        12_600,
        12_600,
        "Train to quarterly planning",
    )
    .await?;
    let approved_report = insert_seed_report(
        db,
        demo_employee.id,
        expense_report::Status::Approved,
        &[&approved_train],
        "Quarterly planning travel",
        &demo_employee.manager,
        Some(today - Duration::days(38)),
        Some(today - Duration::days(35)),
    )
    .await?;

    let charges = charge::Entity::find()
        .filter(charge::Column::EmployeeId.eq(demo_employee.id))
        .order_by_asc(charge::Column::Id)
        .all(db)
        .await?;
    Ok(SeededExpenseRecords {
        employee: demo_employee,
        charges,
        reports: vec![saved_report, submitted_report, approved_report],
    })
}

/// Clears all expense data and reseeds the demo employee.
pub async fn reset_demo_data(db: &DatabaseConnection) -> Result<SeededExpenseRecords, DbErr> {
    charge::Entity::delete_many().exec(db).await?;
    expense_report::Entity::delete_many().exec(db).await?;
    employee::Entity::delete_many().exec(db).await?;
    seed_expenses_demo(db).await
}

#[allow(clippy::too_many_arguments)]
async fn insert_seed_charge(
    db: &DatabaseConnection,
    employee_id: Uuid,
    expense_report_id: Option<Uuid>,
    expense_date: NaiveDate,
    merchant: &str,
    location: &str,
    billed_amount_cents: i64,
    transaction_amount_cents: i64,
    description: &str,
) -> Result<charge::Model, DbErr> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    charge::ActiveModel {
        id: Set(Uuid::new_v4()),
        employee_id: Set(employee_id),
        expense_report_id: Set(expense_report_id),
        expense_date: Set(expense_date),
        merchant: Set(merchant.to_string()),
        location: Set(location.to_string()),
        billed_amount_cents: Set(billed_amount_cents),
        transaction_amount_cents: Set(transaction_amount_cents),
        description: Set(description.to_string()),
        notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

#[allow(clippy::too_many_arguments)]
async fn insert_seed_report(
    db: &DatabaseConnection,
    employee_id: Uuid,
    status: expense_report::Status,
    charges: &[&charge::Model],
    notes: &str,
    approver: &str,
    date_submitted: Option<NaiveDate>,
    date_resolved: Option<NaiveDate>,
) -> Result<expense_report::Model, DbErr> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let amount_cents = charges.iter().map(|c| c.billed_amount_cents).sum();
    let report = expense_report::ActiveModel {
        id: Set(Uuid::new_v4()),
        employee_id: Set(employee_id),
        status: Set(status),
        amount_cents: Set(amount_cents),
        cost_center: Set(DEFAULT_COST_CENTER),
        notes: Set(notes.to_string()),
        approver: Set(approver.to_string()),
        date_submitted: Set(date_submitted),
        date_resolved: Set(date_resolved),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    for record in charges {
        let mut active: charge::ActiveModel = (*record).clone().into();
        active.expense_report_id = Set(Some(report.id));
        active.updated_at = Set(now);
        active.update(db).await?;
    }
    Ok(report)
}
