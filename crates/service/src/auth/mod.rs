pub mod domain;
pub mod errors;
pub mod guard;
pub mod repo;
pub mod repository;
pub mod service;
pub mod token;

pub use domain::Identity;
pub use errors::AuthError;
pub use guard::Guard;
pub use token::TokenService;
