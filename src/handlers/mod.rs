// handlers/mod.rs - Two-tier handler layout
//
// Public (no session required) → Protected (session resolved by middleware)
//
// Protected handlers never read the Authorization header themselves; they
// receive the resolved `Session` as a request extension and pass it straight
// to the service layer, which decides whether an anonymous caller is allowed.
pub mod public;    // Tier 1: /auth/* token acquisition
pub mod protected; // Tier 2: /api/* loan records and session info
