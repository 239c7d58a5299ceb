pub mod config;
pub mod error;
pub mod integrations;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod store;
pub mod types;
