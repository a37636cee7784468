//! # oauth2-store
//!
//! Record types, storage traits and the logging facade shared by OAuth 2.0
//! authorization server storage backends.
//!
//! ## Modules
//!
//! - [`types`] - Client and token records exchanged with a store
//! - [`storage`] - Storage traits the authorization server calls into
//! - [`log`] - Logging facade injected into every store

pub mod log;
pub mod storage;
pub mod types;

pub use log::{Attr, LogLevel, Logger, NoopLogger, SharedLogger, TracingLogger};
pub use storage::{ClientStore, TokenStore};
pub use types::{Client, ClientInfo, Token, TokenInfo};
