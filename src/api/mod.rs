pub mod envelope;
pub mod routes;

// Re-export route handlers for convenience
pub use routes::health;
pub use routes::schedules;
pub use routes::state::AppState;
