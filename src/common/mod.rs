//! Collaborator interfaces and configuration loading

pub mod config;
pub mod traits;
