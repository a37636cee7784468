//! Record types exchanged between the authorization server and its stores.
//!
//! - [`ClientInfo`] / [`Client`] - OAuth 2.0 client registration
//! - [`TokenInfo`] / [`Token`] - issued authorization code, access or refresh grant

pub mod client;
pub mod token;

pub use client::{Client, ClientInfo};
pub use token::{Token, TokenInfo};
