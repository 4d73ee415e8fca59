//! Background [`Task`]s definitions.

mod background;
pub mod issue_monthly_invoices;

pub use common::Handler as Task;

pub use self::{
    background::Background, issue_monthly_invoices::IssueMonthlyInvoices,
};
