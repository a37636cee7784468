//! Storage traits the authorization server calls into.
//!
//! - [`ClientStore`] - client registration lookup
//! - [`TokenStore`] - token persistence, lookup and removal
//!
//! # Implementations
//!
//! Storage implementations are provided in separate crates:
//!
//! - `oauth2-store-postgres` - PostgreSQL storage backend

pub mod client;
pub mod token;

pub use client::ClientStore;
pub use token::TokenStore;
