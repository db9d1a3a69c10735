//! Adapters: wire implementations of the ports plus the HTTP surface.

pub mod firestore;
pub mod http;
pub mod memory;
pub mod stripe;
