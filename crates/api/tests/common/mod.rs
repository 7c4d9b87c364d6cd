#![allow(dead_code)]

use std::sync::Arc;

use api::identity::{CurrentEmployee, MutationToken};
use api::schema::{build_schema, AppSchema};
use async_graphql::{Request, ServerError, Value as GqlValue, Variables};
use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use serde_json::{json, Value};
use uuid::Uuid;

pub struct TestEnv {
    pub schema: async_graphql::Schema<
        api::schema::QueryRoot,
        api::schema::MutationRoot,
        async_graphql::EmptySubscription,
    >,
    pub db: Arc<DatabaseConnection>,
    pub employee: CurrentEmployee,
    pub other_employee: CurrentEmployee,
}

pub async fn setup_env() -> TestEnv {
    let conn = Database::connect("sqlite::memory:").await.unwrap();
    let db = Arc::new(conn);
    bootstrap_sqlite(db.as_ref()).await;

    let employee = insert_employee(db.as_ref(), "John Doe", "johndoe", "Ellen Adams").await;
    let other_employee = insert_employee(db.as_ref(), "Maria Garcia", "maria", "Sanjay Patel").await;

    let AppSchema(schema) = build_schema(db.clone());
    TestEnv {
        schema,
        db,
        employee,
        other_employee,
    }
}

async fn insert_employee(
    db: &DatabaseConnection,
    name: &str,
    alias: &str,
    manager: &str,
) -> CurrentEmployee {
    let now = Utc::now().to_rfc3339();
    let id = Uuid::new_v4();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO employee (id, name, alias, manager, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        vec![
            id.into(),
            name.into(),
            alias.into(),
            manager.into(),
            now.clone().into(),
            now.into(),
        ],
    ))
    .await
    .unwrap();
    CurrentEmployee {
        employee_id: id,
        display_name: name.to_string(),
        manager: manager.to_string(),
    }
}

async fn bootstrap_sqlite(db: &DatabaseConnection) {
    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "PRAGMA foreign_keys = ON;",
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE employee (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            alias TEXT NOT NULL UNIQUE,
            manager TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE expense_report (
            id TEXT PRIMARY KEY,
            employee_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'SAVED',
            amount_cents INTEGER NOT NULL DEFAULT 0,
            cost_center INTEGER NOT NULL DEFAULT 1055,
            notes TEXT NOT NULL,
            approver TEXT NOT NULL,
            date_submitted TEXT,
            date_resolved TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(employee_id) REFERENCES employee(id) ON DELETE CASCADE
        );
        "#,
    ))
    .await
    .unwrap();

    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        r#"
        CREATE TABLE charge (
            id TEXT PRIMARY KEY,
            employee_id TEXT NOT NULL,
            expense_report_id TEXT,
            expense_date TEXT NOT NULL,
            merchant TEXT NOT NULL,
            location TEXT NOT NULL,
            billed_amount_cents INTEGER NOT NULL,
            transaction_amount_cents INTEGER NOT NULL,
            description TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(employee_id) REFERENCES employee(id) ON DELETE CASCADE,
            FOREIGN KEY(expense_report_id) REFERENCES expense_report(id) ON DELETE SET NULL
        );
        "#,
    ))
    .await
    .unwrap();
}

pub async fn exec(env: &TestEnv, query: &str, vars: Value) -> async_graphql::Response {
    exec_as(env, &env.employee, query, vars).await
}

pub async fn exec_as(
    env: &TestEnv,
    who: &CurrentEmployee,
    query: &str,
    vars: Value,
) -> async_graphql::Response {
    env.schema
        .execute(
            Request::new(query)
                .variables(Variables::from_json(vars))
                .data(who.clone())
                .data(MutationToken),
        )
        .await
}

pub async fn exec_without_token(env: &TestEnv, query: &str, vars: Value) -> async_graphql::Response {
    env.schema
        .execute(
            Request::new(query)
                .variables(Variables::from_json(vars))
                .data(env.employee.clone()),
        )
        .await
}

pub fn has_error_code(errors: &[ServerError], code: &str) -> bool {
    errors
        .iter()
        .any(|e| matches_code(e.extensions.as_ref(), code))
}

fn matches_code(values: Option<&async_graphql::ErrorExtensionValues>, code: &str) -> bool {
    match values.and_then(|ext| ext.get("code")) {
        Some(GqlValue::String(s)) => s == code,
        Some(GqlValue::Enum(name)) => name.as_str() == code,
        _ => false,
    }
}

/// Creates an outstanding charge through the API and returns its id.
pub async fn create_charge(env: &TestEnv, merchant: &str, billed_cents: i64) -> String {
    let mutation = r#"
        mutation Create($input: NewChargeInput!) {
            expenses { createCharge(input: $input) { id expenseReportId } }
        }
    "#;
    let vars = json!({
        "input": {
            "expenseDate": "2026-08-01",
            "merchant": merchant,
            "location": "Redmond, WA",
            "billedAmountCents": billed_cents,
            "transactionAmountCents": billed_cents,
            "description": format!("Charge at {}", merchant)
        }
    });
    let resp = exec(env, mutation, vars).await;
    assert!(
        resp.errors.is_empty(),
        "unexpected errors: {:?}",
        resp.errors
    );
    resp.data.into_json().unwrap()["expenses"]["createCharge"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Creates a Saved report over the given charge ids and returns its id.
pub async fn create_report(env: &TestEnv, notes: &str, charge_ids: &[&str]) -> String {
    let mutation = r#"
        mutation Create($input: NewReportInput!) {
            expenses { createReport(input: $input) { id status amountCents } }
        }
    "#;
    let vars = json!({ "input": { "notes": notes, "associatedChargeIds": charge_ids } });
    let resp = exec(env, mutation, vars).await;
    assert!(
        resp.errors.is_empty(),
        "unexpected errors: {:?}",
        resp.errors
    );
    resp.data.into_json().unwrap()["expenses"]["createReport"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

pub fn id_set(values: &Value) -> Vec<String> {
    let mut ids: Vec<String> = values
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

pub fn today_string() -> String {
    Utc::now().date_naive().to_string()
}
