pub mod config;
pub mod error;
pub mod fmv;
pub mod telemetry;
