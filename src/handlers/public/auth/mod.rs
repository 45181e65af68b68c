// handlers/public/auth/mod.rs - Token acquisition
//
// Both endpoints answer with the same grant: { token, user, expiresIn }.

pub mod login;    // POST /auth/login
pub mod register; // POST /auth/register

pub use login::login;
pub use register::register;
