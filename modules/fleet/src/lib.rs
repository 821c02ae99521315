//! Transport records: customers, vehicles, invoices linking the two, and a
//! per-customer payment summary.

pub mod api;
pub mod infra;
pub mod module;

pub use api::rest::payments::{balances, Balance};
pub use infra::storage::entity::{customer, invoice, vehicle};
pub use infra::storage::migrations::Migrator;
pub use module::Fleet;
