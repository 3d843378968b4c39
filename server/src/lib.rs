//! Palengke marketplace backend.
//!
//! REST service connecting farmers, customers and administrators: account
//! registration and JWT auth, farmer verification, product catalog, the
//! order engine, admin oversight with an audit trail, and read-only
//! recommendation reports. All state lives in a single SQLite store.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod store;

pub use routes::router;
pub use state::AppState;
pub use store::Store;
