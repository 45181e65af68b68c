pub mod collection;
pub mod record;
pub mod status;

// Re-export handler functions for use in routing
pub use collection::create as loans_create;
pub use collection::list as loans_list;
pub use record::delete as loan_delete;
pub use record::get as loan_get;
pub use record::put as loan_put;
pub use status::put as loan_status_put;
