pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod routes;
pub mod source;
pub mod state;
pub mod types;
