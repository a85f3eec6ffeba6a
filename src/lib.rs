//! Match Broker - client profile directory and interest workflow for matrimonial brokers
//!
//! Brokers manage the profiles of their clients, search active profiles of
//! every broker, and exchange interests between clients of different brokers.
//! Every read and write by id passes the ownership gate in [`core::guard`].

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{InterestWorkflow, ProfileDirectory, SearchCriteria, SearchSpecBuilder, ServiceError};
pub use models::{Interest, InterestStatus, InterestView, Principal, Profile, ProfileAttributes, ProfileView};
