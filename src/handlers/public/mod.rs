// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Route Prefix: /auth/*
// Middleware: None

pub mod auth;
