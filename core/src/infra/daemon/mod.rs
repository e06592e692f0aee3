//! Daemon wiring: logging, backend construction and the socket server.

mod bootstrap;

pub use bootstrap::{serve, start_default_server, Backend, ShutdownHandle};
