pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

// Re-export the surface callers need
pub use error::SchedulingError;
pub use models::*;
pub use router::scheduling_routes;
pub use services::SchedulingState;
