pub mod api;
pub mod auth;
pub mod client;
pub mod configuration;
pub mod error;
pub mod session;
pub mod telemetry;
pub mod validators;
