pub mod config;
pub mod error;
pub mod message;
pub mod routes;
pub mod secrets;
pub mod services;
pub mod state;
