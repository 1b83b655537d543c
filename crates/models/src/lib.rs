pub mod admin;
pub mod db;
pub mod errors;
pub mod service;
pub mod service_endpoint;
pub mod types;
pub mod usage;
pub mod user;
