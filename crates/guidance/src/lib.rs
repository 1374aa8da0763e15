pub mod accounts;
pub mod admissions;
pub mod catalog;
pub mod config;
pub mod error;
pub mod storage;
pub mod telemetry;
