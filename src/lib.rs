// Core engine
pub mod simulator;

// Shared components
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Domain layer
pub mod publish;
pub mod session;
pub mod tasks;

// Application layer
pub mod api;
pub mod server;
