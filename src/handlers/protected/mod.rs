// handlers/protected/mod.rs - Protected handlers (session required)
//
// Security Level: Session resolved by `session_middleware`
// Route Prefix: /api/*
//
// Every loan handler is a thin adapter: extract the session and inputs,
// call one `LoanService` operation, wrap the result in the envelope.

pub mod auth;  // Session introspection
pub mod loans; // Owner-scoped loan records
