pub mod charge;
pub mod employee;
pub mod expense_report;
