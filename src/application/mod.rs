//! # Application Layer
//!
//! Contains the core logic and orchestration of the bot.
//! This includes the bot core, command routing, argument parsing, help and module management.

pub mod args;
pub mod bot;
pub mod commands;
pub mod context;
pub mod converters;
pub mod help;
pub mod modules;
pub mod router;
pub mod state;
pub mod text;
