//! # Infrastructure Layer
//!
//! Handles interactions with external systems and services.
//! Implements the traits defined in the Domain layer (ChatProvider on Discord, Storage on PostgreSQL)
//! and installs the log subscriber.

pub mod discord;
pub mod logging;
pub mod postgres;
