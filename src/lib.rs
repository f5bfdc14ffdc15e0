//! smarttask: turns one-line natural-language task descriptions into
//! structured task records.
//!
//! Two interchangeable extractors produce [`types::TaskFields`]: a local
//! rule-based pass and a remote chat-completion model. [`board::TaskBoard`]
//! keeps the resulting tasks for an interactive session.
//!
//! See `DESIGN.md` for architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod board;
pub mod config;
pub mod credentials;
pub mod dates;
pub mod extractors;
pub mod logging;
pub mod providers;
pub mod types;
