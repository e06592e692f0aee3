//! Typed procedure router and its bridge over a single IPC channel.
//!
//! The backend declares a [`Router`] of queries and mutations, builds it once and
//! [`attach`]es it to a channel of an [`IpcMain`]. The frontend talks to that channel
//! through an [`RpcClient`] over any [`Transport`]. Errors crossing the boundary are always
//! [`RpcError`] envelopes.

pub mod adapter;
pub mod client;
pub mod envelope;
pub mod error;
pub mod ipc;
pub mod procedure;
pub mod router;
pub mod schema;

pub use adapter::{attach, AdapterOptions, RpcAdapter};
pub use client::{ClientError, LocalTransport, RpcClient, SocketTransport, Transport};
pub use envelope::{generate_request_id, CallEnvelope};
pub use error::{ErrorCode, RpcError};
pub use ipc::{IpcEvent, IpcMain, IpcMessage, IpcReply, IpcServer};
pub use procedure::{Procedure, ProcedureKind};
pub use router::{BuiltRouter, Caller, Router, RouterError};
pub use schema::{Issue, Issues, Schema};
