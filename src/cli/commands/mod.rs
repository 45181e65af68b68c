pub mod auth;
pub mod loan;
pub mod server;
