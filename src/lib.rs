//! Voice Mail — spoken-command email assistant core.

pub mod cli;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod mail;
pub mod nlu;
pub mod speech;
