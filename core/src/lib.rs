#![warn(clippy::all)]

//! Tickbox backend: the todo, theme and language procedures, the store behind them and
//! the daemon that serves them to the UI process.

pub mod api;
pub mod client;
pub mod context;
pub mod domain;
pub mod error;
pub mod infra;
pub mod repository;
pub mod service;

pub use client::TickboxClient;
pub use context::AppContext;
pub use error::{CoreError, Result};
pub use infra::daemon::{start_default_server, Backend};
