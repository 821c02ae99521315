pub mod inbox;
pub mod routes;
