//! # Domain Layer
//!
//! Core definitions, types, and traits that define the business domain of the application.
//! Independent of the Discord library and the database driver.

pub mod config;
pub mod time;
pub mod traits;
pub mod types;
