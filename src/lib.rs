pub mod subjects;
pub mod model;
pub mod contracts;
pub mod transport;
pub mod client;
pub mod blocking;
pub mod handler;
pub mod loopback;
pub mod server;
pub mod events;
pub mod config;

pub use client::{CallTimeouts, CommandClient, CommandError};
pub use contracts::{CommandRequest, CommandResponse, ValidationError};
pub use model::StatusCode;
pub use subjects::Command;
