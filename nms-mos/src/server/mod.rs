//! MOS TCP server

mod connection;
mod listener;

pub use connection::{serve_connection, ConnectionSettings, ConnectionStats};
pub use listener::MosServer;
