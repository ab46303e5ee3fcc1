pub mod api;
pub mod models;
mod lenient;
