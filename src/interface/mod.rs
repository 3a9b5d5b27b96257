//! # Interface Layer
//!
//! The bot's user-facing functionality: the bundled modules and their command handlers.
//! Handlers are invoked by the Router through the `BotModule` trait.

pub mod modules;
