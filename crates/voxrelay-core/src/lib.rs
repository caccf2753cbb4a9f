//! Core types, config, errors, credentials, and session model for voxrelay.

pub mod config;
pub mod credentials;
pub mod error;
pub mod language;
pub mod session;
pub mod types;
