pub mod errors;
pub mod guards;
pub mod routes;
pub mod startup;

pub use startup::{build_router, run, AppState};
