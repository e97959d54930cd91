//! Socius social backend core library.
//!
//! The crate implements the real-time event-delivery subsystem (connection
//! registry, event dispatcher, notification push) and the fan-out-on-read
//! feed assembly over a collection-oriented document store. The store and
//! the identity verifier are external collaborators behind traits; the
//! binary entry point in main.rs wires the in-memory store and the
//! WebSocket transport.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod feed;
pub mod graph;
pub mod models;
pub mod notify;
pub mod posts;
pub mod state;
pub mod store;
mod users;
pub mod ws;
