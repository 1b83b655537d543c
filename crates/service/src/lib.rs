pub mod auth;
pub mod dispatch;
pub mod errors;
pub mod registry;
pub mod usage;
pub mod validate;

pub use errors::ServiceError;
