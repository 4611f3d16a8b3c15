//! # snakes-common
//!
//! Configuration and error types shared by the snakes crates.
//! No request handling and no database access lives here.

pub mod config;
pub mod error;
