pub mod auth;
pub mod categories;
pub mod error;
pub mod extract;
pub mod files;
pub mod messages;
pub mod middleware;
pub mod products;
pub mod reservations;
pub mod router;
pub mod settings;

mod convert;

pub use auth::{AppState, AppStateInner};
pub use router::app;
