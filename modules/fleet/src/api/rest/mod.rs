pub mod customers;
pub mod invoices;
pub mod payments;
pub mod routes;
pub mod vehicles;
